//! Post collection - handle resolution, cursor pagination, pacing,
//! rate-limit cooldown, and the maturity filter
//!
//! Pagination is capped at a fixed number of page requests as a bound
//! on provider load, not a completeness guarantee: high-volume accounts
//! over long windows will be truncated.

pub mod backoff;
pub mod twitter;

use crate::windows::AnalysisWindow;
use backoff::CooldownBackoff;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Post {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub next_cursor: Option<String>,
}

#[derive(Debug)]
pub enum PostFeedError {
    /// The provider's explicit too-many-requests signal. The only
    /// condition that gets a cooldown-and-retry.
    RateLimited,
    /// Everything else - terminal for the analysis
    Feed(String),
}

impl std::fmt::Display for PostFeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostFeedError::RateLimited => write!(f, "post feed rate limited"),
            PostFeedError::Feed(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for PostFeedError {}

/// Social account/post provider seam
#[async_trait]
pub trait PostFeed {
    /// Resolve an account handle to a stable account identifier
    async fn resolve_user(&self, handle: &str) -> Result<String, PostFeedError>;

    /// One page of posts created after `start_time`, newest first,
    /// with an opaque cursor for the next page
    async fn fetch_page(
        &self,
        user_id: &str,
        start_time: DateTime<Utc>,
        cursor: Option<&str>,
    ) -> Result<PostPage, PostFeedError>;
}

#[derive(Debug)]
pub enum CollectError {
    AccountResolution(String),
    PostFetch(String),
    RateLimitExhausted,
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::AccountResolution(msg) => write!(f, "Error fetching user: {}", msg),
            CollectError::PostFetch(msg) => write!(f, "Error fetching posts: {}", msg),
            CollectError::RateLimitExhausted => {
                write!(f, "Post feed rate limit persisted through all cooldown attempts")
            }
        }
    }
}

impl std::error::Error for CollectError {}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Hard cap on pagination requests per analysis
    pub max_page_requests: u32,
    /// Courtesy pause between successive pages
    pub page_pause: Duration,
    pub cooldown_initial: Duration,
    pub cooldown_max: Duration,
    pub cooldown_max_attempts: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_page_requests: 3,
            page_pause: Duration::from_secs(1),
            cooldown_initial: Duration::from_secs(900),
            cooldown_max: Duration::from_secs(3600),
            cooldown_max_attempts: 3,
        }
    }
}

pub struct PostCollector {
    feed: Arc<dyn PostFeed + Send + Sync>,
    config: CollectorConfig,
}

impl PostCollector {
    pub fn new(feed: Arc<dyn PostFeed + Send + Sync>, config: CollectorConfig) -> Self {
        Self { feed, config }
    }

    /// Collect the account's posts within the window, then drop posts
    /// still younger than the window's maturity threshold.
    ///
    /// Any non-rate-limit fetch error aborts collection and discards
    /// partial results.
    pub async fn collect(
        &self,
        handle: &str,
        window: AnalysisWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<Post>, CollectError> {
        let user_id = self
            .feed
            .resolve_user(handle)
            .await
            .map_err(|e| CollectError::AccountResolution(e.to_string()))?;
        log::debug!("Resolved @{} to account id {}", handle, user_id);

        let start_time = now - ChronoDuration::days(i64::from(window.days()));
        let mut posts = Vec::new();
        let mut cursor: Option<String> = None;

        for request in 0..self.config.max_page_requests {
            let page = self
                .fetch_page_with_cooldown(&user_id, start_time, cursor.as_deref())
                .await?;

            posts.extend(page.posts);
            cursor = page.next_cursor;

            if cursor.is_none() {
                break;
            }
            if request + 1 < self.config.max_page_requests {
                tokio::time::sleep(self.config.page_pause).await;
            }
        }

        for post in &mut posts {
            post.author = handle.to_string();
        }

        let threshold = window.kind().maturity_threshold();
        let collected = posts.len();
        posts.retain(|post| post.created_at + threshold < now);
        if posts.len() < collected {
            log::debug!(
                "Maturity filter dropped {} of {} post(s)",
                collected - posts.len(),
                collected
            );
        }

        Ok(posts)
    }

    /// Fetch one page, waiting out rate-limit cooldowns. A retried page
    /// does not consume a pagination slot.
    async fn fetch_page_with_cooldown(
        &self,
        user_id: &str,
        start_time: DateTime<Utc>,
        cursor: Option<&str>,
    ) -> Result<PostPage, CollectError> {
        let mut backoff = CooldownBackoff::new(
            self.config.cooldown_initial,
            self.config.cooldown_max,
            self.config.cooldown_max_attempts,
        );

        loop {
            match self.feed.fetch_page(user_id, start_time, cursor).await {
                Ok(page) => return Ok(page),
                Err(PostFeedError::RateLimited) => {
                    if backoff.cool_down().await.is_err() {
                        return Err(CollectError::RateLimitExhausted);
                    }
                }
                Err(PostFeedError::Feed(msg)) => return Err(CollectError::PostFetch(msg)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn post(id: &str, created_at: DateTime<Utc>) -> Post {
        Post {
            id: id.to_string(),
            author: String::new(),
            text: format!("post {}", id),
            created_at,
        }
    }

    fn fast_config() -> CollectorConfig {
        CollectorConfig {
            max_page_requests: 3,
            page_pause: Duration::from_millis(0),
            cooldown_initial: Duration::from_millis(0),
            cooldown_max: Duration::from_millis(0),
            cooldown_max_attempts: 2,
        }
    }

    /// Scripted feed: pops one response per fetch_page call
    struct ScriptedFeed {
        user_id: Result<String, String>,
        pages: Mutex<Vec<Result<PostPage, PostFeedError>>>,
        fetches: AtomicUsize,
        last_start_time: Mutex<Option<DateTime<Utc>>>,
    }

    impl ScriptedFeed {
        fn new(pages: Vec<Result<PostPage, PostFeedError>>) -> Self {
            Self {
                user_id: Ok("12345".to_string()),
                pages: Mutex::new(pages),
                fetches: AtomicUsize::new(0),
                last_start_time: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl PostFeed for ScriptedFeed {
        async fn resolve_user(&self, _handle: &str) -> Result<String, PostFeedError> {
            self.user_id
                .clone()
                .map_err(PostFeedError::Feed)
        }

        async fn fetch_page(
            &self,
            _user_id: &str,
            start_time: DateTime<Utc>,
            _cursor: Option<&str>,
        ) -> Result<PostPage, PostFeedError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            *self.last_start_time.lock().unwrap() = Some(start_time);

            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                return Ok(PostPage::default());
            }
            pages.remove(0)
        }
    }

    #[tokio::test]
    async fn test_stops_when_cursor_exhausted() {
        let now = Utc::now();
        let feed = Arc::new(ScriptedFeed::new(vec![
            Ok(PostPage {
                posts: vec![post("1", now - ChronoDuration::hours(2))],
                next_cursor: Some("cursor-1".to_string()),
            }),
            Ok(PostPage {
                posts: vec![post("2", now - ChronoDuration::hours(3))],
                next_cursor: None,
            }),
        ]));
        let collector = PostCollector::new(feed.clone(), fast_config());

        let posts = collector
            .collect("trader", AnalysisWindow::clamped(1), now)
            .await
            .unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(feed.fetches.load(Ordering::SeqCst), 2);
        assert!(posts.iter().all(|p| p.author == "trader"));
    }

    #[tokio::test]
    async fn test_pagination_capped_at_max_requests() {
        let now = Utc::now();
        let endless_page = || {
            Ok(PostPage {
                posts: vec![post("x", now - ChronoDuration::hours(5))],
                next_cursor: Some("more".to_string()),
            })
        };
        let feed = Arc::new(ScriptedFeed::new(vec![
            endless_page(),
            endless_page(),
            endless_page(),
            endless_page(),
        ]));
        let collector = PostCollector::new(feed.clone(), fast_config());

        let posts = collector
            .collect("trader", AnalysisWindow::clamped(1), now)
            .await
            .unwrap();

        assert_eq!(feed.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(posts.len(), 3);
    }

    #[tokio::test]
    async fn test_maturity_filter_short_window() {
        let now = Utc::now();
        let feed = Arc::new(ScriptedFeed::new(vec![Ok(PostPage {
            posts: vec![
                post("fresh", now - ChronoDuration::minutes(10)),
                post("mature", now - ChronoDuration::minutes(20)),
            ],
            next_cursor: None,
        })]));
        let collector = PostCollector::new(feed, fast_config());

        let posts = collector
            .collect("trader", AnalysisWindow::clamped(1), now)
            .await
            .unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "mature");
    }

    #[tokio::test]
    async fn test_maturity_filter_long_window() {
        let now = Utc::now();
        let feed = Arc::new(ScriptedFeed::new(vec![Ok(PostPage {
            posts: vec![
                post("fresh", now - ChronoDuration::hours(2)),
                post("mature", now - ChronoDuration::hours(4)),
            ],
            next_cursor: None,
        })]));
        let collector = PostCollector::new(feed, fast_config());

        let posts = collector
            .collect("trader", AnalysisWindow::clamped(3), now)
            .await
            .unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "mature");
    }

    #[tokio::test]
    async fn test_account_resolution_failure_is_terminal() {
        let mut feed = ScriptedFeed::new(vec![]);
        feed.user_id = Err("no such user: ghost".to_string());
        let collector = PostCollector::new(Arc::new(feed), fast_config());

        let err = collector
            .collect("ghost", AnalysisWindow::clamped(1), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::AccountResolution(_)));
        assert!(err.to_string().starts_with("Error fetching user:"));
    }

    #[tokio::test]
    async fn test_rate_limit_retried_then_succeeds() {
        let now = Utc::now();
        let feed = Arc::new(ScriptedFeed::new(vec![
            Err(PostFeedError::RateLimited),
            Ok(PostPage {
                posts: vec![post("1", now - ChronoDuration::hours(1))],
                next_cursor: None,
            }),
        ]));
        let collector = PostCollector::new(feed.clone(), fast_config());

        let posts = collector
            .collect("trader", AnalysisWindow::clamped(1), now)
            .await
            .unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(feed.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion_is_terminal() {
        let feed = Arc::new(ScriptedFeed::new(vec![
            Err(PostFeedError::RateLimited),
            Err(PostFeedError::RateLimited),
            Err(PostFeedError::RateLimited),
        ]));
        let collector = PostCollector::new(feed, fast_config());

        let err = collector
            .collect("trader", AnalysisWindow::clamped(1), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::RateLimitExhausted));
    }

    #[tokio::test]
    async fn test_generic_fetch_error_discards_partial_results() {
        let now = Utc::now();
        let feed = Arc::new(ScriptedFeed::new(vec![
            Ok(PostPage {
                posts: vec![post("1", now - ChronoDuration::hours(1))],
                next_cursor: Some("cursor-1".to_string()),
            }),
            Err(PostFeedError::Feed("HTTP 500".to_string())),
        ]));
        let collector = PostCollector::new(feed, fast_config());

        let err = collector
            .collect("trader", AnalysisWindow::clamped(1), now)
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::PostFetch(_)));
    }

    #[tokio::test]
    async fn test_window_start_time_reflects_clamp() {
        let now = Utc::now();
        let feed = Arc::new(ScriptedFeed::new(vec![Ok(PostPage::default())]));
        let collector = PostCollector::new(feed.clone(), fast_config());

        collector
            .collect("trader", AnalysisWindow::clamped(30), now)
            .await
            .unwrap();

        let start = feed.last_start_time.lock().unwrap().unwrap();
        assert_eq!(start, now - ChronoDuration::days(7));
    }
}
