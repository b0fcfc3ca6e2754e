use gallery_client::{Locale, PageQuery, Post, PostApi, Slot, resolve_descriptions};

use crate::notice::Notice;

pub const DEFAULT_CATEGORY: Slot = Slot::Teenager;

/// Public gallery: one large image with its description for the chosen
/// audience, plus a strip of thumbnails.
#[derive(Debug)]
pub struct GalleryView {
    posts: Vec<Post>,
    selected: usize,
    category: Slot,
    locale: Locale,
    notice: Option<Notice>,
}

impl Default for GalleryView {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl GalleryView {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            selected: 0,
            category: DEFAULT_CATEGORY,
            locale: Locale::En,
            notice: None,
        }
    }

    /// Fetches the first `limit` posts in `locale`. On failure the current
    /// posts stay on screen.
    pub async fn load<A: PostApi + ?Sized>(&mut self, api: &A, locale: Locale, limit: u32) {
        self.locale = locale;
        match api.get_all_post(PageQuery::new(1, limit, locale)).await {
            Ok(page) => {
                self.posts = page.posts;
                self.selected = self.selected.min(self.posts.len().saturating_sub(1));
                self.notice = None;
            }
            Err(err) => self.notice = Some(Notice::from_error("Error loading data", &err)),
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn category(&self) -> Slot {
        self.category
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.posts.len().saturating_sub(1));
    }

    pub fn next(&mut self) {
        self.select(self.selected.saturating_add(1));
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn set_category(&mut self, category: Slot) {
        self.category = category;
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    pub fn current_post(&self) -> Option<&Post> {
        self.posts.get(self.selected)
    }

    /// Description of the selected post for the chosen audience.
    pub fn current_text(&self) -> Option<String> {
        self.current_post().map(|post| {
            resolve_descriptions(post, self.locale)
                .get(self.category)
                .to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePostApi, german, post};
    use gallery_client::ClientError;

    #[test]
    fn selection_is_clamped() {
        let mut view = GalleryView::new(vec![post("a", "1"), post("b", "2"), post("c", "3")]);
        view.previous();
        assert_eq!(view.selected(), 0);
        view.next();
        view.next();
        view.next();
        assert_eq!(view.selected(), 2);
        view.select(10);
        assert_eq!(view.selected(), 2);
    }

    #[test]
    fn empty_gallery_has_nothing_selected() {
        let mut view = GalleryView::default();
        view.next();
        assert_eq!(view.selected(), 0);
        assert!(view.current_text().is_none());
    }

    #[test]
    fn text_follows_category_and_locale_with_fallback() {
        let mut first = post("a", "ai text");
        first.descriptions_en.teenager = "teen text".into();
        german(&mut first, "KI Text");
        let second = post("b", "only english");

        let mut view = GalleryView::new(vec![first, second]);
        assert_eq!(view.category(), Slot::Teenager);
        assert_eq!(view.current_text().as_deref(), Some("teen text"));

        view.set_category(Slot::Ai);
        view.set_locale(Locale::De);
        assert_eq!(view.current_text().as_deref(), Some("KI Text"));

        view.next();
        assert_eq!(view.current_text().as_deref(), Some("only english"));
    }

    #[tokio::test]
    async fn load_keeps_posts_on_failure() {
        let api = FakePostApi::with_posts(4);
        let mut view = GalleryView::default();
        view.load(&api, Locale::En, 10).await;
        assert_eq!(view.posts().len(), 4);
        view.select(3);

        api.fail_next(ClientError::Http {
            status: 503,
            message: "maintenance".into(),
        });
        view.load(&api, Locale::De, 10).await;
        assert_eq!(view.posts().len(), 4);
        assert_eq!(view.selected(), 3);
        assert_eq!(view.notice().map(|n| n.message.as_str()), Some("maintenance"));
    }
}
