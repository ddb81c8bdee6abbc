use crate::cache::{CacheEntry, CacheStore, ListOrder};
use crate::error::{DictError, FetchError, Result};
use crate::result::{LookupResult, Source};

/// One upstream source of dictionary data.
pub trait Fetcher {
    fn source(&self) -> Source;
    fn fetch(&self, word: &str) -> Result<LookupResult, FetchError>;
}

/// Trims every token and joins them with single spaces. Case is kept as typed.
pub fn normalize_keyword<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .flat_map(|p| p.as_ref().split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cache-or-fetch flow for a single word. The only writer of the word cache.
pub struct Lookup<'a> {
    store: &'a CacheStore,
    web: Box<dyn Fetcher + 'a>,
    api: Option<Box<dyn Fetcher + 'a>>,
}

impl<'a> Lookup<'a> {
    pub fn new(store: &'a CacheStore, web: Box<dyn Fetcher + 'a>) -> Self {
        Lookup {
            store,
            web,
            api: None,
        }
    }

    pub fn with_api(mut self, api: Box<dyn Fetcher + 'a>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn lookup(&self, keyword: &str, force_refresh: bool, use_api: bool) -> Result<LookupResult> {
        let keyword = normalize_keyword(&[keyword]);

        if !force_refresh {
            if let Some(result) = self.cached(&keyword)? {
                tracing::debug!(keyword = %keyword, "cache hit");
                return Ok(result);
            }
        }

        let fetcher = self.fetcher(use_api)?;
        tracing::debug!(keyword = %keyword, source = ?fetcher.source(), force_refresh, "fetching");
        let mut result = fetcher.fetch(&keyword)?;
        if result.query.is_empty() {
            result.query = keyword.clone();
        }

        if result.is_ok() {
            self.store.put(&keyword, &result)?;
        } else {
            tracing::warn!(keyword = %keyword, code = %result.error_code, "upstream error code, not caching");
        }
        Ok(result)
    }

    fn fetcher(&self, use_api: bool) -> Result<&(dyn Fetcher + 'a)> {
        if !use_api {
            return Ok(self.web.as_ref());
        }
        self.api
            .as_deref()
            .ok_or_else(|| DictError::Config("API credentials are not configured".into()))
    }

    /// A row that no longer decodes counts as a miss.
    fn cached(&self, keyword: &str) -> Result<Option<LookupResult>> {
        let Some(entry) = self.store.get(keyword)? else {
            tracing::debug!(keyword, "cache miss");
            return Ok(None);
        };
        match entry.result() {
            Ok(result) => Ok(Some(result)),
            Err(err @ DictError::CacheCorrupt { .. }) => {
                tracing::warn!(error = %err, "ignoring cached entry");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Removes one word and hands back the key that was actually deleted.
    pub fn forget(&self, keyword: &str) -> Result<String> {
        let keyword = normalize_keyword(&[keyword]);
        match self.store.delete(&keyword)? {
            0 => Err(DictError::NotFound(keyword)),
            _ => Ok(keyword),
        }
    }

    pub fn clear(&self) -> Result<usize> {
        self.store.clear()
    }

    pub fn list(&self, order: ListOrder) -> Result<Vec<CacheEntry>> {
        self.store.list_all(order)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::result::ERROR_CODE_OK;
    use pretty_assertions::assert_eq;

    type Reply = Box<dyn Fn(&str) -> Result<LookupResult, FetchError>>;

    struct FakeFetcher {
        source: Source,
        calls: Rc<Cell<usize>>,
        reply: Reply,
    }

    impl Fetcher for FakeFetcher {
        fn source(&self) -> Source {
            self.source
        }

        fn fetch(&self, word: &str) -> Result<LookupResult, FetchError> {
            self.calls.set(self.calls.get() + 1);
            (self.reply)(word)
        }
    }

    fn fake(source: Source, reply: Reply) -> (Box<FakeFetcher>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let fetcher = FakeFetcher {
            source,
            calls: Rc::clone(&calls),
            reply,
        };
        (Box::new(fetcher), calls)
    }

    fn gloss(source: Source) -> Reply {
        Box::new(move |word: &str| {
            Ok(LookupResult {
                basic_explanations: vec![format!("{word} gloss")],
                ..LookupResult::new(word, source)
            })
        })
    }

    fn count(store: &CacheStore, keyword: &str) -> i64 {
        store.get(keyword).unwrap().unwrap().lookup_count
    }

    #[test]
    fn cache_hit_skips_network() {
        let store = CacheStore::open_in_memory().unwrap();
        let (web, calls) = fake(Source::Web, gloss(Source::Web));
        let lookup = Lookup::new(&store, web);

        let first = lookup.lookup("good", false, false).unwrap();
        let second = lookup.lookup("good", false, false).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
        assert_eq!(count(&store, "good"), 1);
    }

    #[test]
    fn forced_refresh_fetches_and_counts() {
        let store = CacheStore::open_in_memory().unwrap();
        let (web, calls) = fake(Source::Web, gloss(Source::Web));
        let lookup = Lookup::new(&store, web);

        lookup.lookup("good", false, false).unwrap();
        lookup.lookup("good", true, false).unwrap();
        lookup.lookup("good", false, false).unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(count(&store, "good"), 2);
    }

    #[test]
    fn normalizes_keyword_before_cache() {
        let store = CacheStore::open_in_memory().unwrap();
        let (web, calls) = fake(Source::Web, gloss(Source::Web));
        let lookup = Lookup::new(&store, web);

        lookup.lookup("  good   morning ", false, false).unwrap();
        lookup.lookup("good morning", false, false).unwrap();

        assert_eq!(calls.get(), 1);
        assert!(store.get("good morning").unwrap().is_some());
        assert_eq!(normalize_keyword(&["good ", " day", "to  you"]), "good day to you");
    }

    #[test]
    fn picks_fetcher_by_flag() {
        let store = CacheStore::open_in_memory().unwrap();
        let (web, web_calls) = fake(Source::Web, gloss(Source::Web));
        let (api, api_calls) = fake(Source::Api, gloss(Source::Api));
        let lookup = Lookup::new(&store, web).with_api(api);

        let result = lookup.lookup("good", true, true).unwrap();
        assert_eq!(result.source, Source::Api);
        assert_eq!((web_calls.get(), api_calls.get()), (0, 1));

        let result = lookup.lookup("good", true, false).unwrap();
        assert_eq!(result.source, Source::Web);
        assert_eq!((web_calls.get(), api_calls.get()), (1, 1));
    }

    #[test]
    fn api_without_credentials_is_config_error() {
        let store = CacheStore::open_in_memory().unwrap();
        let (web, calls) = fake(Source::Web, gloss(Source::Web));
        let lookup = Lookup::new(&store, web);

        assert!(matches!(
            lookup.lookup("good", false, true),
            Err(DictError::Config(_))
        ));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn timeout_leaves_cache_untouched() {
        let store = CacheStore::open_in_memory().unwrap();
        let (web, _) = fake(Source::Web, Box::new(|_: &str| Err(FetchError::Timeout)));
        let lookup = Lookup::new(&store, web);

        let err = lookup.lookup("good", false, false).unwrap_err();
        assert!(matches!(err, DictError::Fetch(ref e) if e.is_network_unavailable()));
        assert!(store.get("good").unwrap().is_none());
    }

    #[test]
    fn vendor_error_code_is_returned_not_cached() {
        let store = CacheStore::open_in_memory().unwrap();
        let (api, _) = fake(
            Source::Api,
            Box::new(|word: &str| {
                Ok(LookupResult {
                    error_code: "108".into(),
                    ..LookupResult::new(word, Source::Api)
                })
            }),
        );
        let (web, _) = fake(Source::Web, gloss(Source::Web));
        let lookup = Lookup::new(&store, web).with_api(api);

        let result = lookup.lookup("good", false, true).unwrap();
        assert_eq!(result.error_code, "108");
        assert!(store.get("good").unwrap().is_none());
    }

    #[test]
    fn empty_query_echo_uses_keyword() {
        let store = CacheStore::open_in_memory().unwrap();
        let (web, _) = fake(
            Source::Web,
            Box::new(|_: &str| Ok(LookupResult::new("", Source::Web))),
        );
        let lookup = Lookup::new(&store, web);

        let result = lookup.lookup("good", false, false).unwrap();
        assert_eq!(result.query, "good");
        assert_eq!(result.error_code, ERROR_CODE_OK);
    }

    #[test]
    fn corrupt_entry_falls_through_to_fetch() {
        let store = CacheStore::open_in_memory().unwrap();
        store.put_raw("good", "][").unwrap();
        let (web, calls) = fake(Source::Web, gloss(Source::Web));
        let lookup = Lookup::new(&store, web);

        let result = lookup.lookup("good", false, false).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(result.basic_explanations, vec!["good gloss"]);
        assert_eq!(store.get("good").unwrap().unwrap().result().unwrap(), result);
    }

    #[test]
    fn forget_missing_word_is_not_found() {
        let store = CacheStore::open_in_memory().unwrap();
        let (web, _) = fake(Source::Web, gloss(Source::Web));
        let lookup = Lookup::new(&store, web);

        assert!(matches!(lookup.forget("nothing"), Err(DictError::NotFound(_))));
        lookup.lookup("good", false, false).unwrap();
        assert_eq!(lookup.forget(" good ").unwrap(), "good");
        assert!(lookup.list(ListOrder::Insertion).unwrap().is_empty());
    }

    #[test]
    fn forget_reports_normalized_keyword() {
        let store = CacheStore::open_in_memory().unwrap();
        let (web, _) = fake(Source::Web, gloss(Source::Web));
        let lookup = Lookup::new(&store, web);

        lookup.lookup("good morning", false, false).unwrap();
        assert_eq!(lookup.forget("good  morning").unwrap(), "good morning");
        assert!(store.get("good morning").unwrap().is_none());
    }

    #[test]
    fn clear_then_list_is_empty() {
        let store = CacheStore::open_in_memory().unwrap();
        let (web, _) = fake(Source::Web, gloss(Source::Web));
        let lookup = Lookup::new(&store, web);

        lookup.lookup("good", false, false).unwrap();
        lookup.lookup("bad", false, false).unwrap();
        assert_eq!(lookup.clear().unwrap(), 2);
        assert!(lookup.list(ListOrder::KeywordAsc).unwrap().is_empty());
    }
}
