//! In-memory backend used by the controller tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use async_trait::async_trait;
use gallery_client::{
    Acknowledgement, AuthApi, ClientError, DescriptionBlock, ImageUpload, LoginResponse, Locale,
    PageQuery, Post, PostApi, PostDescriptions, PostMutation, PostPage, ProfileUpdate, User,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(PageQuery),
    Search(String, PageQuery),
    Create,
    Update(String, bool),
    Delete(String),
    Get(String),
}

#[derive(Default)]
pub struct FakePostApi {
    posts: RefCell<Vec<Post>>,
    calls: RefCell<Vec<Call>>,
    failures: RefCell<VecDeque<ClientError>>,
    next_id: Cell<u32>,
}

pub fn post(id: &str, ai: &str) -> Post {
    Post {
        id: id.to_string(),
        image: Some(format!("{id}.png")),
        descriptions_en: DescriptionBlock {
            ai: ai.to_string(),
            ..DescriptionBlock::default()
        },
        descriptions_de: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn image() -> ImageUpload {
    ImageUpload::new("cat.png", "image/png", vec![1, 2, 3])
}

impl FakePostApi {
    pub fn with_posts(count: usize) -> Self {
        let api = Self::default();
        for i in 1..=count {
            api.posts
                .borrow_mut()
                .push(post(&format!("p{i}"), &format!("post {i}")));
        }
        api
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn fail_next(&self, err: ClientError) {
        self.failures.borrow_mut().push_back(err);
    }

    pub fn stored(&self, id: &str) -> Option<Post> {
        self.posts.borrow().iter().find(|p| p.id == id).cloned()
    }

    fn record(&self, call: Call) -> Result<(), ClientError> {
        self.calls.borrow_mut().push(call);
        match self.failures.borrow_mut().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn page_of(posts: Vec<Post>, query: PageQuery) -> PostPage {
        let limit = query.limit as usize;
        let total = posts.len();
        let total_pages = total.div_ceil(limit) as u32;
        let start = (query.page as usize - 1) * limit;
        let posts: Vec<Post> = posts.into_iter().skip(start).take(limit).collect();
        PostPage {
            current_page: query.page,
            total_pages,
            total_posts: total as u64,
            next_page: query.page < total_pages,
            posts,
        }
    }

    fn not_found() -> ClientError {
        ClientError::Http {
            status: 404,
            message: "Post not found".into(),
        }
    }
}

#[async_trait(?Send)]
impl PostApi for FakePostApi {
    async fn create_post(
        &self,
        descriptions: PostDescriptions,
        image: ImageUpload,
    ) -> Result<PostMutation, ClientError> {
        self.record(Call::Create)?;
        self.next_id.set(self.next_id.get() + 1);
        let created = Post {
            id: format!("new-{}", self.next_id.get()),
            image: Some(image.file_name),
            descriptions_en: descriptions.en,
            descriptions_de: descriptions.de,
            created_at: None,
            updated_at: None,
        };
        self.posts.borrow_mut().insert(0, created.clone());
        Ok(PostMutation {
            success: true,
            message: Some("Post created successfully".into()),
            post: created,
        })
    }

    async fn get_all_post(&self, query: PageQuery) -> Result<PostPage, ClientError> {
        self.record(Call::List(query))?;
        Ok(Self::page_of(self.posts.borrow().clone(), query))
    }

    async fn search_posts(&self, text: &str, query: PageQuery) -> Result<PostPage, ClientError> {
        self.record(Call::Search(text.to_string(), query))?;
        let needle = text.to_lowercase();
        let hits = self
            .posts
            .borrow()
            .iter()
            .filter(|p| {
                let block = gallery_client::resolve_descriptions(p, query.language);
                block.iter().any(|(_, text)| text.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        Ok(Self::page_of(hits, query))
    }

    async fn update_post(
        &self,
        id: &str,
        descriptions: PostDescriptions,
        image: Option<ImageUpload>,
    ) -> Result<PostMutation, ClientError> {
        self.record(Call::Update(id.to_string(), image.is_some()))?;
        let mut posts = self.posts.borrow_mut();
        let stored = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(Self::not_found)?;
        stored.descriptions_en = descriptions.en;
        if let Some(de) = descriptions.de {
            stored.descriptions_de = Some(de);
        }
        if let Some(image) = image {
            stored.image = Some(image.file_name);
        }
        Ok(PostMutation {
            success: true,
            message: Some("Post updated successfully".into()),
            post: stored.clone(),
        })
    }

    async fn delete_post(&self, id: &str) -> Result<Acknowledgement, ClientError> {
        self.record(Call::Delete(id.to_string()))?;
        let mut posts = self.posts.borrow_mut();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(Self::not_found());
        }
        Ok(Acknowledgement {
            success: true,
            message: Some("Post deleted successfully".into()),
        })
    }

    async fn get_post_by_id(&self, id: &str) -> Result<Post, ClientError> {
        self.record(Call::Get(id.to_string()))?;
        self.stored(id).ok_or_else(Self::not_found)
    }
}

/// Account backend holding a single user.
pub struct FakeAuthApi {
    pub user: Option<User>,
    pub password: String,
    pub updates: Vec<ProfileUpdate>,
    pub fail_next: Option<ClientError>,
}

impl FakeAuthApi {
    pub fn signed_in(name: &str) -> Self {
        Self {
            user: Some(User {
                id: "u1".into(),
                name: Some(name.into()),
                email: Some("admin@example.com".into()),
                image: None,
                role: Some("admin".into()),
            }),
            password: "secret1".into(),
            updates: Vec::new(),
            fail_next: None,
        }
    }
}

#[async_trait(?Send)]
impl AuthApi for FakeAuthApi {
    async fn login(&mut self, _email: &str, _password: &str) -> Result<LoginResponse, ClientError> {
        Err(ClientError::Validation("not used".into()))
    }

    async fn update_user(&mut self, _id: &str, update: ProfileUpdate) -> Result<User, ClientError> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        let user = self.user.as_mut().ok_or(ClientError::Auth {
            status: Some(401),
            message: "no user".into(),
        })?;
        if let Some(name) = &update.name {
            user.name = Some(name.clone());
        }
        if let Some(image) = &update.image {
            user.image = Some(image.file_name.clone());
        }
        let user = user.clone();
        self.updates.push(update);
        Ok(user)
    }

    async fn change_password(
        &mut self,
        old_password: &str,
        new_password: &str,
    ) -> Result<Acknowledgement, ClientError> {
        if old_password != self.password {
            return Err(ClientError::Http {
                status: 400,
                message: "Old password is incorrect".into(),
            });
        }
        self.password = new_password.to_string();
        Ok(Acknowledgement {
            success: true,
            message: Some("Password changed successfully".into()),
        })
    }

    fn logout(&mut self) {
        self.user = None;
    }

    fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

pub fn german(post: &mut Post, ai: &str) {
    post.descriptions_de = Some(DescriptionBlock {
        ai: ai.to_string(),
        ..DescriptionBlock::default()
    });
}

pub fn locale_of(call: &Call) -> Option<Locale> {
    match call {
        Call::List(q) | Call::Search(_, q) => Some(q.language),
        _ => None,
    }
}
