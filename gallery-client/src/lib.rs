use async_trait::async_trait;

pub mod config;
pub mod descriptions;
pub mod error;
pub mod http_client;
pub mod logging;
pub mod models;
pub mod session;

pub use config::{ClientConfig, ConfigError};
pub use descriptions::{SENTINEL, resolve_descriptions, resolve_wire};
pub use error::{ClientError, ErrorKind};
pub use http_client::GalleryClientHttp;
pub use models::{
    Acknowledgement, DescriptionBlock, ImageUpload, LoginResponse, Locale, PageQuery, Post,
    PostDescriptions, PostMutation, PostPage, ProfileUpdate, Slot, User,
};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionState, SessionStore};

/// Post endpoints of the gallery backend.
#[async_trait(?Send)]
pub trait PostApi {
    async fn create_post(
        &self,
        descriptions: PostDescriptions,
        image: ImageUpload,
    ) -> Result<PostMutation, ClientError>;
    async fn get_all_post(&self, query: PageQuery) -> Result<PostPage, ClientError>;
    async fn search_posts(&self, text: &str, query: PageQuery) -> Result<PostPage, ClientError>;
    async fn update_post(
        &self,
        id: &str,
        descriptions: PostDescriptions,
        image: Option<ImageUpload>,
    ) -> Result<PostMutation, ClientError>;
    async fn delete_post(&self, id: &str) -> Result<Acknowledgement, ClientError>;
    async fn get_post_by_id(&self, id: &str) -> Result<Post, ClientError>;
}

/// Account endpoints. Implementations keep the session in sync.
#[async_trait(?Send)]
pub trait AuthApi {
    async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, ClientError>;
    async fn update_user(&mut self, id: &str, update: ProfileUpdate) -> Result<User, ClientError>;
    async fn change_password(
        &mut self,
        old_password: &str,
        new_password: &str,
    ) -> Result<Acknowledgement, ClientError>;
    fn logout(&mut self);
    fn current_user(&self) -> Option<&User>;
}
