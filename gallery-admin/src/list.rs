//! State behind the admin "all posts" table.
//!
//! Every fetch is planned first ([`ListController::plan_fetch`]), executed
//! against a [`PostApi`], and handed back through [`ListController::apply`]
//! together with its token. Responses for anything but the latest plan are
//! dropped, so a slow search for "x" can never overwrite the result of a
//! later search for "y".

use std::ops::RangeInclusive;
use std::time::Duration;

use gallery_client::{ClientConfig, ClientError, Locale, PageQuery, Post, PostApi, PostPage};
use tracing::{debug, info};

use crate::debounce::{Debouncer, SEARCH_DEBOUNCE};
use crate::notice::Notice;
use crate::sequencer::{RequestSequencer, RequestToken};

pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const PREVIEW_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchKind {
    All,
    Search(String),
}

/// A fetch the controller wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub token: RequestToken,
    pub kind: FetchKind,
    pub query: PageQuery,
}

impl FetchPlan {
    pub async fn execute<A: PostApi + ?Sized>(&self, api: &A) -> Result<PostPage, ClientError> {
        match &self.kind {
            FetchKind::All => api.get_all_post(self.query).await,
            FetchKind::Search(text) => api.search_posts(text, self.query).await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Fresh,
    Stale,
}

#[derive(Debug)]
pub struct ListController {
    page: u32,
    page_size: u32,
    query: String,
    locale: Locale,
    total_pages: u32,
    total_posts: u64,
    items: Vec<Post>,
    loaded: bool,
    loading: bool,
    notice: Option<Notice>,
    sequencer: RequestSequencer,
    debouncer: Debouncer<String>,
}

impl Default for ListController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListController {
    pub fn new(page_size: u32) -> Self {
        Self::with_debounce(page_size, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(page_size: u32, delay: Duration) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            query: String::new(),
            locale: Locale::En,
            total_pages: 1,
            total_posts: 0,
            items: Vec::new(),
            loaded: false,
            loading: false,
            notice: None,
            sequencer: RequestSequencer::new(),
            debouncer: Debouncer::new(delay),
        }
    }

    /// Page size and search debounce taken from `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_debounce(config.page_size, config.search_debounce)
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn starting_at(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_posts(&self) -> u64 {
        self.total_posts
    }

    pub fn items(&self) -> &[Post] {
        &self.items
    }

    /// True once any fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn is_searching(&self) -> bool {
        !self.query.trim().is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn page_numbers(&self) -> RangeInclusive<u32> {
        1..=self.total_pages.max(1)
    }

    /// 1-based position of the item at `index` across all pages.
    pub fn row_number(&self, index: usize) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size) + index as u64 + 1
    }

    pub fn search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Plans a fetch of the current page, query and locale.
    pub fn plan_fetch(&mut self) -> FetchPlan {
        let token = self.sequencer.issue();
        let kind = match self.query.trim() {
            "" => FetchKind::All,
            text => FetchKind::Search(text.to_string()),
        };
        self.loading = true;
        debug!(%token, page = self.page, ?kind, "fetch planned");
        FetchPlan {
            token,
            kind,
            query: PageQuery::new(self.page, self.page_size, self.locale),
        }
    }

    /// Moves to page `n`, never below 1. Callers keep `n` within
    /// `1..=total_pages`.
    pub fn set_page(&mut self, n: u32) -> FetchPlan {
        self.page = n.max(1);
        // the fetch below already uses the latest query text
        self.debouncer.cancel();
        self.plan_fetch()
    }

    /// Records new search text. Nothing is fetched until the debounce window
    /// has passed, see [`ListController::poll_search`] and
    /// [`ListController::next_search`].
    pub fn set_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.query = text.clone();
        self.debouncer.push(text);
    }

    /// Plan for the settled search text, if the window is over.
    pub fn poll_search(&mut self) -> Option<FetchPlan> {
        let text = self.debouncer.poll_ready()?;
        self.query = text;
        Some(self.plan_fetch())
    }

    /// Waits for the pending search text to settle and plans its fetch.
    pub async fn next_search(&mut self) -> Option<FetchPlan> {
        let text = self.debouncer.ready().await?;
        self.query = text;
        Some(self.plan_fetch())
    }

    /// Switches the content locale. An active search restarts from page 1
    /// with the same text.
    pub fn set_locale(&mut self, locale: Locale) -> FetchPlan {
        self.locale = locale;
        if self.is_searching() {
            self.page = 1;
        }
        self.debouncer.cancel();
        self.plan_fetch()
    }

    /// Applies the outcome of the fetch planned with `token`.
    pub fn apply(&mut self, token: RequestToken, result: Result<PostPage, ClientError>) -> Applied {
        if !self.sequencer.is_current(token) {
            debug!(%token, "dropping stale response");
            return Applied::Stale;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                self.items = page.posts;
                self.total_pages = page.total_pages.max(1);
                self.total_posts = page.total_posts;
                self.loaded = true;
                if self.notice.as_ref().is_some_and(Notice::is_error) {
                    self.notice = None;
                }
            }
            Err(err) => {
                let fallback = if self.is_searching() {
                    "Failed to search posts"
                } else {
                    "Failed to fetch posts"
                };
                self.notice = Some(Notice::from_error(fallback, &err));
            }
        }
        Applied::Fresh
    }

    /// Executes `plan` and applies its result.
    pub async fn run<A: PostApi + ?Sized>(&mut self, api: &A, plan: FetchPlan) -> Applied {
        let result = plan.execute(api).await;
        self.apply(plan.token, result)
    }

    pub async fn refresh<A: PostApi + ?Sized>(&mut self, api: &A) -> Applied {
        let plan = self.plan_fetch();
        self.run(api, plan).await
    }

    pub async fn go_to_page<A: PostApi + ?Sized>(&mut self, api: &A, n: u32) -> Applied {
        let plan = self.set_page(n);
        self.run(api, plan).await
    }

    pub async fn change_locale<A: PostApi + ?Sized>(&mut self, api: &A, locale: Locale) -> Applied {
        let plan = self.set_locale(locale);
        self.run(api, plan).await
    }

    /// Waits for the debounced search text and runs it.
    pub async fn flush_search<A: PostApi + ?Sized>(&mut self, api: &A) -> Option<Applied> {
        let plan = self.next_search().await?;
        Some(self.run(api, plan).await)
    }

    /// Deletes a post and reloads the view, stepping back a page when the
    /// deleted post was the only one on it. Returns `None` when the delete
    /// itself failed; the list is left as it was.
    pub async fn delete<A: PostApi + ?Sized>(&mut self, api: &A, id: &str) -> Option<Applied> {
        match api.delete_post(id).await {
            Ok(_) => {
                info!(post_id = id, "post deleted from list");
                self.notice = Some(Notice::success("Post deleted successfully"));
                if self.items.len() == 1 && self.page > 1 {
                    self.page -= 1;
                }
                let plan = self.plan_fetch();
                Some(self.run(api, plan).await)
            }
            Err(err) => {
                self.notice = Some(Notice::from_error("Failed to delete post", &err));
                None
            }
        }
    }
}

/// Shortens `text` to `max` characters for table cells.
pub fn truncate_preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max).collect();
    short.push_str("...");
    short
}
