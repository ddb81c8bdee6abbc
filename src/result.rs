use serde::{Deserialize, Serialize};

/// Error code reported by upstream on success.
pub const ERROR_CODE_OK: &str = "0";
/// Local sentinel for a result that has not been fetched from anywhere yet.
pub const ERROR_CODE_UNFETCHED: &str = "60";
/// Upstream only ever hands out a handful of web phrases; we keep the same cap for both sources.
pub const MAX_WEB_PHRASES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Api,
    #[default]
    Web,
}

/// Either the English uk/us pair or a single phonetic (pinyin and friends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pronunciation {
    Pair {
        #[serde(rename = "ukPhonetic")]
        uk: String,
        #[serde(rename = "usPhonetic")]
        us: String,
    },
    Single { phonetic: String },
}

impl Pronunciation {
    /// Picks the pair when both accents are known, else whichever single value exists.
    pub fn from_parts(
        phonetic: Option<String>,
        uk: Option<String>,
        us: Option<String>,
    ) -> Option<Self> {
        match (uk, us) {
            (Some(uk), Some(us)) => Some(Pronunciation::Pair { uk, us }),
            (uk, us) => phonetic
                .or(uk)
                .or(us)
                .filter(|p| !p.is_empty())
                .map(|phonetic| Pronunciation::Single { phonetic }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebPhrase {
    pub key: String,
    pub values: Vec<String>,
}

/// The normalized shape both fetchers produce and the cache stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub query: String,
    pub error_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_pronunciation: Option<Pronunciation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub basic_explanations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_phrases: Vec<WebPhrase>,
    #[serde(default)]
    pub source: Source,
}

impl LookupResult {
    pub fn new(query: impl Into<String>, source: Source) -> Self {
        LookupResult {
            query: query.into(),
            error_code: ERROR_CODE_OK.to_string(),
            basic_pronunciation: None,
            basic_explanations: Vec::new(),
            translations: Vec::new(),
            web_phrases: Vec::new(),
            source,
        }
    }

    pub fn unfetched(query: impl Into<String>, source: Source) -> Self {
        LookupResult {
            error_code: ERROR_CODE_UNFETCHED.to_string(),
            ..LookupResult::new(query, source)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error_code == ERROR_CODE_OK
    }

    /// True when a successful lookup carries nothing worth showing.
    pub fn is_empty(&self) -> bool {
        self.basic_explanations.is_empty()
            && self.translations.is_empty()
            && self.web_phrases.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}
