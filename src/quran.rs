use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::QuizError;

pub const DEFAULT_API_BASE: &str = "https://api.alquran.cloud/v1";
pub const DEFAULT_EDITION: &str = "quran-uthmani";

/// One ayah as it appears on a mushaf page
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Verse {
    pub text: String,
    pub surah_name: String,
    pub surah_english_name: Option<String>,
    pub number_in_surah: Option<u32>,
    /// Zero-based index of the ayah within its page
    pub position: usize,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiSurah {
    name: Option<String>,
    #[serde(rename = "englishName")]
    english_name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ApiAyah {
    text: Option<String>,
    #[serde(rename = "numberInSurah")]
    number_in_surah: Option<u32>,
    surah: Option<ApiSurah>,
}

/// Extract the verse list from a page response body.
///
/// Anything that does not look like `{ data: { ayahs: [...] } }` yields an
/// empty page rather than an error. Inside the array every element becomes
/// a verse, so the page keeps its true length; null or malformed fields
/// come through blank.
pub fn parse_page(body: &Value) -> Vec<Verse> {
    let Some(ayahs) = body
        .get("data")
        .and_then(|data| data.get("ayahs"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    ayahs
        .iter()
        .map(|raw| ApiAyah::deserialize(raw).unwrap_or_default())
        .enumerate()
        .map(|(position, ayah)| {
            let surah = ayah.surah.unwrap_or_default();
            Verse {
                text: ayah.text.unwrap_or_default().trim().to_string(),
                surah_name: surah.name.unwrap_or_default().trim().to_string(),
                surah_english_name: surah.english_name,
                number_in_surah: ayah.number_in_surah,
                position,
            }
        })
        .collect()
}

/// Anything that can produce the verses of a page
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, page: u16) -> Result<Vec<Verse>, QuizError>;
}

#[derive(Clone)]
pub struct QuranClient {
    client: Client,
    base_url: String,
    edition: String,
}

impl QuranClient {
    pub fn new(base_url: &str, edition: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            edition: edition.to_string(),
        }
    }

    pub fn page_url(&self, page: u16) -> String {
        format!("{}/page/{}/{}", self.base_url, page, self.edition)
    }
}

impl Default for QuranClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE, DEFAULT_EDITION)
    }
}

#[async_trait]
impl PageSource for QuranClient {
    async fn fetch_page(&self, page: u16) -> Result<Vec<Verse>, QuizError> {
        let url = self.page_url(page);
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(&url)
            .header("cache-control", "no-store")
            .send()
            .await
            .map_err(|e| QuizError::fetch(page, e))?;

        if !response.status().is_success() {
            return Err(QuizError::fetch(
                page,
                format!("HTTP {}", response.status()),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| QuizError::fetch(page, e))?;

        Ok(parse_page(&body))
    }
}

/// Pages fetched during this process, never evicted
pub type PageCache = HashMap<u16, Arc<[Verse]>>;

/// Page lookup backed by a cache; only successful fetches are stored
pub struct PageFetcher<S: ?Sized = dyn PageSource> {
    source: Arc<S>,
    cache: PageCache,
}

impl<S: PageSource> PageFetcher<S> {
    pub fn new(source: S) -> Self {
        Self::from_shared(Arc::new(source))
    }
}

impl<S: PageSource + ?Sized> PageFetcher<S> {
    pub fn from_shared(source: Arc<S>) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    /// Shared handle to the underlying source, for fetching off the UI thread
    pub fn source(&self) -> Arc<S> {
        Arc::clone(&self.source)
    }

    pub fn cached(&self, page: u16) -> Option<Arc<[Verse]>> {
        self.cache.get(&page).cloned()
    }

    pub fn store(&mut self, page: u16, verses: Vec<Verse>) -> Arc<[Verse]> {
        let verses: Arc<[Verse]> = verses.into();
        self.cache.insert(page, Arc::clone(&verses));
        verses
    }

    /// Pages from `pages` that still need a network round trip
    pub fn missing(&self, pages: &[u16]) -> Vec<u16> {
        pages
            .iter()
            .copied()
            .filter(|page| !self.cache.contains_key(page))
            .collect()
    }

    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }

    pub async fn get_page(&mut self, page: u16) -> Result<Arc<[Verse]>, QuizError> {
        if let Some(verses) = self.cached(page) {
            debug!(page, "page cache hit");
            return Ok(verses);
        }

        let verses = self.source.fetch_page(page).await?;
        debug!(page, verses = verses.len(), "page fetched");
        Ok(self.store(page, verses))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::question::{generate, QuizMode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) fn verse(position: usize, text: &str, surah: &str) -> Verse {
        Verse {
            text: text.to_string(),
            surah_name: surah.to_string(),
            surah_english_name: None,
            number_in_surah: Some(position as u32 + 1),
            position,
        }
    }

    pub(crate) fn page_of(n: usize) -> Vec<Verse> {
        (0..n)
            .map(|i| verse(i, &format!("ayah {}", i + 1), "سُورَةُ البَقَرَةِ"))
            .collect()
    }

    /// In-memory source that counts requests and can be told to fail
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub pages: Mutex<HashMap<u16, Vec<Verse>>>,
        pub failing: Mutex<Vec<u16>>,
        pub calls: AtomicUsize,
    }

    impl FakeSource {
        pub(crate) fn with_page(self, page: u16, verses: Vec<Verse>) -> Self {
            self.pages.lock().unwrap().insert(page, verses);
            self
        }

        pub(crate) fn failing_on(self, page: u16) -> Self {
            self.failing.lock().unwrap().push(page);
            self
        }
    }

    #[async_trait]
    impl PageSource for FakeSource {
        async fn fetch_page(&self, page: u16) -> Result<Vec<Verse>, QuizError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.lock().unwrap().contains(&page) {
                return Err(QuizError::fetch(page, "HTTP 503 Service Unavailable"));
            }
            Ok(self
                .pages
                .lock()
                .unwrap()
                .get(&page)
                .cloned()
                .unwrap_or_default())
        }
    }

    #[test]
    fn test_parse_page() {
        let body = json!({
            "code": 200,
            "status": "OK",
            "data": {
                "number": 1,
                "ayahs": [
                    {
                        "number": 1,
                        "text": " بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ ",
                        "numberInSurah": 1,
                        "surah": { "number": 1, "name": "سُورَةُ ٱلْفَاتِحَةِ", "englishName": "Al-Faatiha" }
                    },
                    {
                        "number": 2,
                        "text": "ٱلْحَمْدُ لِلَّهِ رَبِّ ٱلْعَٰلَمِينَ",
                        "numberInSurah": 2,
                        "surah": { "number": 1, "name": "سُورَةُ ٱلْفَاتِحَةِ", "englishName": "Al-Faatiha" }
                    }
                ]
            }
        });

        let verses = parse_page(&body);
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[0].text, "بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ");
        assert_eq!(verses[0].surah_name, "سُورَةُ ٱلْفَاتِحَةِ");
        assert_eq!(verses[0].surah_english_name.as_deref(), Some("Al-Faatiha"));
        assert_eq!(verses[1].position, 1);
        assert_eq!(verses[1].number_in_surah, Some(2));
    }

    #[test]
    fn test_parse_page_unexpected_shape_is_empty() {
        assert!(parse_page(&json!({ "code": 404, "data": "Not found" })).is_empty());
        assert!(parse_page(&json!({ "data": { "ayahs": {} } })).is_empty());
        assert!(parse_page(&json!([])).is_empty());
    }

    #[test]
    fn test_parse_page_missing_surah() {
        let verses = parse_page(&json!({ "data": { "ayahs": [ { "text": "x" } ] } }));
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].surah_name, "");
        assert_eq!(verses[0].number_in_surah, None);
    }

    #[test]
    fn test_parse_page_keeps_ayat_with_null_fields() {
        let body = json!({
            "data": {
                "ayahs": [
                    { "text": "a", "numberInSurah": 1, "surah": { "name": "سُورَةُ النَّبَإِ" } },
                    { "text": "b", "numberInSurah": 2, "surah": { "name": null, "englishName": null } },
                    { "text": null, "numberInSurah": 3, "surah": { "name": "سُورَةُ النَّبَإِ" } },
                    { "text": "d", "numberInSurah": null, "surah": null },
                    "not an ayah"
                ]
            }
        });

        let verses = parse_page(&body);
        assert_eq!(verses.len(), 5);
        let positions: Vec<usize> = verses.iter().map(|v| v.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);
        assert_eq!(verses[1].surah_name, "");
        assert_eq!(verses[2].text, "");
        assert_eq!(verses[3].text, "d");
        assert_eq!(verses[3].number_in_surah, None);
        assert_eq!(verses[4].text, "");
        assert_eq!(verses[4].number_in_surah, None);

        let mut rng = StdRng::seed_from_u64(7);
        let card = generate(&mut rng, QuizMode::Surah, &verses[1..2], 582, None).unwrap();
        assert_eq!(card.answer, "غير معروف");
        let card = generate(&mut rng, QuizMode::AyahCount, &verses, 582, None).unwrap();
        assert_eq!(card.answer, "5");
    }

    #[test]
    fn test_page_url() {
        let client = QuranClient::new("https://api.alquran.cloud/v1/", "quran-uthmani");
        assert_eq!(
            client.page_url(604),
            "https://api.alquran.cloud/v1/page/604/quran-uthmani"
        );
    }

    #[tokio::test]
    async fn test_get_page_uses_cache() {
        let mut fetcher = PageFetcher::new(FakeSource::default().with_page(3, page_of(8)));

        let first = fetcher.get_page(3).await.unwrap();
        let second = fetcher.get_page(3).await.unwrap();

        assert_eq!(first.len(), 8);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.source().calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.cached_pages(), 1);
    }

    #[tokio::test]
    async fn test_get_page_failure_leaves_cache_untouched() {
        let mut fetcher = PageFetcher::new(FakeSource::default().failing_on(9));

        let err = fetcher.get_page(9).await.unwrap_err();
        assert!(matches!(err, QuizError::Fetch { page: 9, .. }));
        assert!(fetcher.cached(9).is_none());

        // Retrying hits the source again
        let _ = fetcher.get_page(9).await;
        assert_eq!(fetcher.source().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_page_caches_empty_page() {
        let mut fetcher = PageFetcher::new(FakeSource::default());
        let verses = fetcher.get_page(42).await.unwrap();
        assert!(verses.is_empty());
        assert!(fetcher.cached(42).is_some());
    }

    #[test]
    fn test_missing_pages() {
        let mut fetcher = PageFetcher::new(FakeSource::default());
        fetcher.store(10, page_of(3));
        assert_eq!(fetcher.missing(&[10, 11]), vec![11]);
        assert!(fetcher.missing(&[10]).is_empty());
    }
}
