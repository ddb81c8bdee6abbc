//! Scraper for the public dict.youdao.com pages.
//!
//! The page layout is not ours, so every region is optional: a missing block
//! only makes the result sparser. Anchors used on the search page:
//!
//! - `#results-contents` main results container
//! - `.keyword` echo of the query
//! - `#phrsListTab` basic dictionary, with `.trans-container li` glosses and `.phonetic` markers
//! - `#webPhrase .wordGroup` web phrases, key in `.search-js`, values after the first `span`
//!
//! When the basic dictionary yields nothing, fanyi.youdao.com is asked for a plain translation.

use regex::Regex;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::FetchError;
use crate::http;
use crate::lookup::Fetcher;
use crate::result::{LookupResult, Pronunciation, Source, WebPhrase, MAX_WEB_PHRASES};

const SEARCH_URL: &str = "http://dict.youdao.com/search?keyfrom=dict.top";
const TRANSLATE_URL: &str = "http://fanyi.youdao.com/translate?keyfrom=dict.top";
const TRANSLATE_RESULT_PATTERN: &str = r#""translateResult"\s*:\s*"#;

// 构建查询的url
pub fn build_query_url(base: &str, param: &str, word: &str) -> Result<Url, FetchError> {
    let mut parsed = http::parse_endpoint(base)?;
    parsed.query_pairs_mut().append_pair(param, word);
    Ok(parsed)
}

pub struct WebFetcher {
    client: Client,
    translate_pattern: Regex,
}

impl WebFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Ok(WebFetcher {
            client: http::build_client()?,
            translate_pattern: translate_pattern()?,
        })
    }

    /// Second chance for phrases and sentences the dictionary has no entry for.
    /// A non-2xx answer or an unrecognizable page means "no translation", not a failed lookup.
    fn get_translation(&self, word: &str) -> Result<Option<Vec<String>>, FetchError> {
        let url = build_query_url(TRANSLATE_URL, "i", word)?;
        let body = match http::get_text(&self.client, &url) {
            Ok(body) => body,
            Err(FetchError::HttpStatus(code)) => {
                tracing::warn!(code, word, "translate page unavailable");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match extract_translations(&self.translate_pattern, &body) {
            Ok(translations) => Ok(Some(translations)),
            Err(e) => {
                tracing::warn!(word, error = %e, "translate page not understood");
                Ok(None)
            }
        }
    }
}

impl Fetcher for WebFetcher {
    fn source(&self) -> Source {
        Source::Web
    }

    fn fetch(&self, word: &str) -> Result<LookupResult, FetchError> {
        let url = build_query_url(SEARCH_URL, "q", word)?;
        let page = http::get_text(&self.client, &url)?;
        assemble(word, &page, || self.get_translation(word))
    }
}

/// Builds the result from the search page, pulling in the translation only when needed.
pub fn assemble<F>(word: &str, search_page: &str, translate: F) -> Result<LookupResult, FetchError>
where
    F: FnOnce() -> Result<Option<Vec<String>>, FetchError>,
{
    let mut result = parse_search_page(word, search_page)?;
    if result.basic_explanations.is_empty() {
        tracing::debug!(word, "no basic dictionary entry, falling back to translation");
        result.translations = translate()?.unwrap_or_default();
    }
    Ok(result)
}

fn select(css: &'static str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Malformed(format!("selector {css}: {e}")))
}

fn translate_pattern() -> Result<Regex, FetchError> {
    Regex::new(TRANSLATE_RESULT_PATTERN).map_err(|e| FetchError::Malformed(e.to_string()))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Drops the enclosing bracket characters, e.g. `[gʊd]` or `/gʊd/`.
fn strip_brackets(marker: &str) -> String {
    let mut chars = marker.trim().chars();
    chars.next();
    chars.next_back();
    chars.as_str().to_string()
}

/// Extracts everything the search page offers. Never falls back to the network.
pub fn parse_search_page(word: &str, html: &str) -> Result<LookupResult, FetchError> {
    let document = Html::parse_document(html);
    let mut result = LookupResult::new(word, Source::Web);

    let Some(root) = document.select(&select("#results-contents")?).next() else {
        tracing::debug!(word, "results container missing");
        return Ok(result);
    };

    if let Some(keyword) = root
        .select(&select(".keyword")?)
        .next()
        .map(text_of)
        .filter(|k| !k.is_empty())
    {
        result.query = keyword;
    }

    if let Some(basic) = root.select(&select("#phrsListTab")?).next() {
        parse_basic(basic, &mut result)?;
    }

    if let Some(web) = root.select(&select("#webPhrase")?).next() {
        result.web_phrases = parse_web_phrases(web)?;
    }

    Ok(result)
}

fn parse_basic(basic: ElementRef<'_>, result: &mut LookupResult) -> Result<(), FetchError> {
    if let Some(trans) = basic.select(&select(".trans-container")?).next() {
        result.basic_explanations = trans
            .select(&select("li")?)
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect();

        // 中文查词时没有 li，只有一个 wordGroup
        if result.basic_explanations.is_empty() {
            if let Some(group) = trans.select(&select(".wordGroup")?).next() {
                let joined = group
                    .text()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if !joined.is_empty() {
                    result.basic_explanations.push(joined);
                }
            }
        }
    }

    // Vendor order is uk first, us second. Any other count is ambiguous.
    let phonetics: Vec<String> = basic
        .select(&select(".phonetic")?)
        .map(|p| strip_brackets(&p.text().collect::<String>()))
        .collect();
    result.basic_pronunciation = match phonetics.as_slice() {
        [uk, us] => Some(Pronunciation::Pair {
            uk: uk.clone(),
            us: us.clone(),
        }),
        [single] => Some(Pronunciation::Single {
            phonetic: single.clone(),
        }),
        _ => None,
    };
    Ok(())
}

fn parse_web_phrases(web: ElementRef<'_>) -> Result<Vec<WebPhrase>, FetchError> {
    let key_sel = select(".search-js")?;
    let span_sel = select("span")?;
    let phrases = web
        .select(&select(".wordGroup")?)
        .take(MAX_WEB_PHRASES)
        .filter_map(|group| {
            let key = group.select(&key_sel).next().map(text_of)?;
            let values: Vec<String> = group
                .select(&span_sel)
                .next()
                .and_then(|span| span.next_sibling())
                .and_then(|node| node.value().as_text().map(|t| t.trim().to_string()))
                .map(|text| {
                    text.split(';')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();
            Some(WebPhrase { key, values })
        })
        .collect();
    Ok(phrases)
}

/// Pulls `"translateResult":[[...], ...]` out of the translate page and keeps every `tgt`,
/// one inner group per paragraph.
pub fn extract_translations(pattern: &Regex, html: &str) -> Result<Vec<String>, FetchError> {
    let Some(start) = pattern.find(html) else {
        return Err(FetchError::Malformed("translateResult not found".into()));
    };
    let groups: Vec<Vec<serde_json::Value>> =
        serde_json::Deserializer::from_str(&html[start.end()..])
            .into_iter::<Vec<Vec<serde_json::Value>>>()
            .next()
            .ok_or_else(|| FetchError::Malformed("translateResult is empty".into()))?
            .map_err(|e| FetchError::Malformed(format!("translateResult: {e}")))?;
    Ok(groups
        .iter()
        .flatten()
        .filter_map(|entry| entry.get("tgt").and_then(|t| t.as_str()))
        .map(String::from)
        .collect())
}
