use crate::{
    clicks::ClickRecorder,
    codegen::{CodeGenError, MAX_CODE_LENGTH, generate_code},
    db::{DbError, LinksDB},
    models::{NewShortLink, ShortLink},
};
use quick_cache::sync::Cache;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("no free short code after {attempts} attempts: {source}")]
    CodeCollision { attempts: usize, source: DbError },
    #[error("short link not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] DbError),
    #[error(transparent)]
    CodeGeneration(#[from] CodeGenError),
}

#[derive(Clone)]
pub struct App {
    db: Arc<dyn LinksDB>,
    clicks: ClickRecorder,
    base_url: String,
    code_length: usize,
    max_attempts: usize,
    cache: Arc<Cache<String, String>>,
}

impl App {
    /// `code_length` is clamped to `1..=MAX_CODE_LENGTH` and `max_attempts`
    /// to at least 1, so every `shorten` call tries to save at least once.
    pub fn new(
        base_url: String,
        code_length: usize,
        max_attempts: usize,
        db: Arc<dyn LinksDB>,
        cache_size: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            clicks: ClickRecorder::new(Arc::clone(&db)),
            db,
            base_url,
            code_length: code_length.clamp(1, MAX_CODE_LENGTH),
            max_attempts: max_attempts.max(1),
            cache: Arc::new(Cache::new(cache_size.max(1))),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stores `original_url` under a freshly generated short code.
    ///
    /// A taken code is retried with a new one up to `max_attempts` times;
    /// any other storage failure is returned right away.
    #[instrument(skip(self), err)]
    pub async fn shorten(&self, original_url: &str) -> Result<ShortLink, LinkError> {
        for attempt in 1..=self.max_attempts {
            let short_code = generate_code(self.code_length)?;

            let new_link = NewShortLink::new(short_code, original_url.to_string());

            match self.db.create(&new_link).await {
                Ok(link) => {
                    info!(short_code = link.short_code, id = link.id, "link created");

                    self.cache
                        .insert(link.short_code.clone(), link.original_url.clone());

                    return Ok(link);
                }
                Err(DbError::DuplicateCode) => {
                    warn!(short_code = new_link.short_code, attempt, "code collision");
                }
                Err(e) => {
                    error!("db error: {e}");
                    return Err(LinkError::Storage(e));
                }
            }
        }

        Err(LinkError::CodeCollision {
            attempts: self.max_attempts,
            source: DbError::DuplicateCode,
        })
    }

    /// Looks up the destination of `short_code` and counts the visit in the
    /// background.
    #[instrument(skip(self))]
    pub async fn resolve(&self, short_code: &str) -> Result<String, LinkError> {
        if let Some(url) = self.cache.get(short_code) {
            info!(short_code, "redirect from cache");
            self.clicks.record(short_code);
            return Ok(url);
        }

        let Some(link) = self.db.get(short_code).await? else {
            info!(short_code, "unknown link");
            return Err(LinkError::NotFound(short_code.to_string()));
        };

        info!(short_code, "redirect from db");

        self.cache
            .insert(link.short_code.clone(), link.original_url.clone());

        self.clicks.record(short_code);

        Ok(link.original_url)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryDb, MockLinksDB};
    use chrono::Utc;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn stored(id: i32, link: &NewShortLink) -> ShortLink {
        ShortLink::from_new(id, link)
    }

    fn app_with(db: impl LinksDB + 'static) -> Arc<App> {
        App::new(
            "http://localhost:8080".to_string(),
            6,
            DEFAULT_MAX_ATTEMPTS,
            Arc::new(db),
            10,
        )
    }

    #[tokio::test]
    async fn test_shorten_success() {
        let mut db = MockLinksDB::new();
        db.expect_create()
            .times(1)
            .returning(|link| Ok(stored(7, link)));

        let app = app_with(db);

        let link = app.shorten("https://example.com").await.unwrap();

        assert_eq!(link.id, 7);
        assert_eq!(link.short_code.len(), 6);
        assert!(
            link.short_code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(link.original_url, "https://example.com");
        assert_eq!(link.clicks, 0);
        assert!(Utc::now() - link.created_at < chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_shorten_returns_saved_code() {
        let saved = Arc::new(Mutex::new(String::new()));
        let saved_in_mock = Arc::clone(&saved);

        let mut db = MockLinksDB::new();
        db.expect_create().times(1).returning(move |link| {
            *saved_in_mock.lock().unwrap() = link.short_code.clone();
            Ok(stored(1, link))
        });

        let app = app_with(db);
        let link = app.shorten("https://example.com").await.unwrap();

        assert_eq!(link.short_code, *saved.lock().unwrap());
    }

    #[tokio::test]
    async fn test_retry_once_on_collision() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_mock = Arc::clone(&calls);

        let mut db = MockLinksDB::new();
        db.expect_create().returning(move |link| {
            if calls_in_mock.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DbError::DuplicateCode)
            } else {
                Ok(stored(2, link))
            }
        });

        let app = app_with(db);
        let link = app.shorten("https://example.com").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(link.id, 2);
    }

    #[tokio::test]
    async fn test_collisions_exhaust_attempts() {
        let mut db = MockLinksDB::new();
        db.expect_create()
            .times(DEFAULT_MAX_ATTEMPTS)
            .returning(|_| Err(DbError::DuplicateCode));

        let app = app_with(db);
        let res = app.shorten("https://example.com").await;

        assert!(matches!(
            res,
            Err(LinkError::CodeCollision {
                attempts: 5,
                source: DbError::DuplicateCode
            })
        ));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_saves_once() {
        let mut db = MockLinksDB::new();
        db.expect_create()
            .times(1)
            .returning(|link| Ok(stored(1, link)));

        let app = App::new("http://x".to_string(), 6, 0, Arc::new(db), 10);

        assert!(app.shorten("https://a").await.is_ok());
    }

    #[tokio::test]
    async fn test_code_length_is_clamped() {
        let app = App::new("http://x".to_string(), 0, 1, Arc::new(MemoryDb::new()), 10);
        assert_eq!(app.shorten("https://a").await.unwrap().short_code.len(), 1);

        let app = App::new("http://x".to_string(), 64, 1, Arc::new(MemoryDb::new()), 10);
        assert_eq!(
            app.shorten("https://a").await.unwrap().short_code.len(),
            MAX_CODE_LENGTH
        );
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let mut db = MockLinksDB::new();
        db.expect_create()
            .times(1)
            .returning(|_| Err(DbError::General("connection refused".into())));

        let app = app_with(db);
        let res = app.shorten("https://example.com").await;

        assert!(matches!(res, Err(LinkError::Storage(DbError::General(_)))));
    }

    #[tokio::test]
    async fn test_shorten_empty_url_takes_normal_path() {
        let app = app_with(MemoryDb::new());

        let link = app.shorten("").await.unwrap();

        assert_eq!(link.original_url, "");
        assert_eq!(link.short_code.len(), 6);
        assert_eq!(app.resolve(&link.short_code).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_resolve_counts_click() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut db = MockLinksDB::new();
        db.expect_get().times(1).returning(|code| {
            Ok(Some(ShortLink {
                id: 1,
                short_code: code.to_string(),
                original_url: "https://example.com/page".to_string(),
                clicks: 0,
                created_at: Utc::now(),
            }))
        });
        db.expect_increment_clicks().times(1).returning(move |code| {
            tx.send(code.to_string()).unwrap();
            Ok(())
        });

        let app = app_with(db);

        let url = app.resolve("abc123").await.unwrap();
        assert_eq!(url, "https://example.com/page");

        let counted = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("increment was not dispatched");
        assert_eq!(counted.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_resolve_clicks_eventually_stored() {
        let db = Arc::new(MemoryDb::new());
        db.create(&NewShortLink::new(
            "abc123".into(),
            "https://example.com/page".into(),
        ))
        .await
        .unwrap();

        let app = App::new(
            "http://localhost:8080".to_string(),
            6,
            DEFAULT_MAX_ATTEMPTS,
            db.clone(),
            10,
        );

        assert_eq!(
            app.resolve("abc123").await.unwrap(),
            "https://example.com/page"
        );

        let mut clicks = 0;
        for _ in 0..50 {
            clicks = db.get("abc123").await.unwrap().unwrap().clicks;
            if clicks == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(clicks, 1);
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let mut db = MockLinksDB::new();
        db.expect_get().times(1).returning(|_| Ok(None));
        db.expect_increment_clicks().never();

        let app = app_with(db);

        let res = app.resolve("doesnotexist").await;
        assert!(matches!(res, Err(LinkError::NotFound(code)) if code == "doesnotexist"));

        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_resolve_ignores_failed_increment() {
        let mut db = MockLinksDB::new();
        db.expect_get().returning(|code| {
            Ok(Some(ShortLink {
                id: 1,
                short_code: code.to_string(),
                original_url: "https://example.com".to_string(),
                clicks: 0,
                created_at: Utc::now(),
            }))
        });
        db.expect_increment_clicks()
            .returning(|_| Err(DbError::General("deadlock detected".into())));

        let app = app_with(db);

        assert_eq!(app.resolve("abc123").await.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn test_caching() {
        let mut db = MockLinksDB::new();
        db.expect_get().times(1).returning(|code| {
            Ok(Some(ShortLink {
                id: 1,
                short_code: code.to_string(),
                original_url: "url".to_string(),
                clicks: 0,
                created_at: Utc::now(),
            }))
        });
        db.expect_increment_clicks().times(2).returning(|_| Ok(()));

        let app = app_with(db);

        let res = app.resolve("foo").await.unwrap();
        assert_eq!(&res, "url");

        let res = app.resolve("foo").await.unwrap();
        assert_eq!(&res, "url");

        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_resolve_storage_error() {
        let mut db = MockLinksDB::new();
        db.expect_get()
            .returning(|_| Err(DbError::General("pool timed out".into())));
        db.expect_increment_clicks().never();

        let app = app_with(db);

        assert!(matches!(
            app.resolve("abc123").await,
            Err(LinkError::Storage(_))
        ));
    }
}
