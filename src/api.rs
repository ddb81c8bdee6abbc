use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use crate::error::FetchError;
use crate::http;
use crate::lookup::Fetcher;
use crate::result::{LookupResult, Pronunciation, Source, WebPhrase, MAX_WEB_PHRASES};
use crate::sign::{fresh_salt, sign};

const API_URL: &str = "http://openapi.youdao.com/api";
const FROM_LANG: &str = "En";
const TO_LANG: &str = "zh-CHS";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    error_code: Option<String>,
    query: Option<String>,
    translation: Option<Vec<String>>,
    basic: Option<ApiBasic>,
    web: Option<Vec<ApiWeb>>,
}

#[derive(Debug, Deserialize)]
struct ApiBasic {
    phonetic: Option<String>,
    #[serde(rename = "uk-phonetic")]
    uk_phonetic: Option<String>,
    #[serde(rename = "us-phonetic")]
    us_phonetic: Option<String>,
    #[serde(default)]
    explains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiWeb {
    key: String,
    #[serde(default)]
    value: Vec<String>,
}

/// Fetches through the signed openapi.youdao.com endpoint.
pub struct ApiFetcher {
    client: Client,
    endpoint: Url,
    app_key: String,
    secret_key: String,
}

impl ApiFetcher {
    pub fn new(app_key: &str, secret_key: &str) -> Result<Self, FetchError> {
        Ok(ApiFetcher {
            client: http::build_client()?,
            endpoint: http::parse_endpoint(API_URL)?,
            app_key: app_key.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    // 构建查询的url
    pub fn build_query_url(&self, word: &str, salt: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("appKey", &self.app_key)
            .append_pair("q", word)
            .append_pair("from", FROM_LANG)
            .append_pair("to", TO_LANG)
            .append_pair("salt", salt)
            .append_pair("sign", &sign(&self.app_key, &self.secret_key, word, salt));
        url
    }
}

impl Fetcher for ApiFetcher {
    fn source(&self) -> Source {
        Source::Api
    }

    fn fetch(&self, word: &str) -> Result<LookupResult, FetchError> {
        let url = self.build_query_url(word, &fresh_salt());
        let body = http::get_text(&self.client, &url)?;
        parse_response(word, &body)
    }
}

/// Maps the vendor JSON onto `LookupResult`. Missing fields stay empty.
pub fn parse_response(word: &str, body: &str) -> Result<LookupResult, FetchError> {
    let resp: ApiResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let mut result = LookupResult::unfetched(word, Source::Api);
    if let Some(code) = resp.error_code {
        result.error_code = code;
    }
    if let Some(query) = resp.query.filter(|q| !q.is_empty()) {
        result.query = query;
    }
    result.translations = resp.translation.unwrap_or_default();
    if let Some(basic) = resp.basic {
        result.basic_pronunciation =
            Pronunciation::from_parts(basic.phonetic, basic.uk_phonetic, basic.us_phonetic);
        result.basic_explanations = basic.explains;
    }
    result.web_phrases = resp
        .web
        .unwrap_or_default()
        .into_iter()
        .take(MAX_WEB_PHRASES)
        .map(|w| WebPhrase {
            key: w.key,
            values: w.value,
        })
        .collect();
    Ok(result)
}
