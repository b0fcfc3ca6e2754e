use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::{
    Acknowledgement, ImageUpload, LoginResponse, PageQuery, Post, PostDescriptions, PostEnvelope,
    PostMutation, PostPage, ProfileUpdate, RawPostPage, User, UserMutation,
};
use crate::session::Session;
use crate::{AuthApi, PostApi};

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("email pattern compiles")
});

pub fn validate_credentials(email: &str, password: &str) -> Result<(), ClientError> {
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(ClientError::Validation("Invalid email address".into()));
    }
    validate_password(password)
}

pub fn validate_password(password: &str) -> Result<(), ClientError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct GalleryClientHttp {
    client: Arc<Client>,
    base_url: String,
    session: Session,
}

impl GalleryClientHttp {
    pub fn connect(endpoint: &str, session: Session) -> Result<Self, ClientError> {
        Self::with_client(endpoint, Client::builder().build()?, session)
    }

    pub fn from_config(config: &ClientConfig, session: Session) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Self::with_client(&config.api_url, client, session)
    }

    fn with_client(endpoint: &str, client: Client, session: Session) -> Result<Self, ClientError> {
        let base_url = endpoint.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Validation("API base URL is empty".into()));
        }
        Ok(Self {
            client: Arc::new(client),
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // Universal send: 2xx is decoded, anything else becomes a ClientError
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        operation: &str,
    ) -> Result<T, ClientError> {
        let resp = self.authorized(builder).send().await?;
        let status = resp.status();
        debug!(operation, status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(ClientError::from_http_response(resp).await);
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Http {
            status: status.as_u16(),
            message: format!("malformed response body: {e}"),
        })
    }
}

fn image_part(image: &ImageUpload) -> Result<Part, ClientError> {
    Part::bytes(image.bytes.clone())
        .file_name(image.file_name.clone())
        .mime_str(&image.content_type)
        .map_err(|_| {
            ClientError::Validation(format!("invalid image content type: {}", image.content_type))
        })
}

fn post_form(
    descriptions: &PostDescriptions,
    image: Option<&ImageUpload>,
) -> Result<Form, ClientError> {
    let mut form = Form::new().text("descriptions_en", descriptions.en.to_wire_string()?);
    if let Some(de) = &descriptions.de {
        form = form.text("descriptions_de", de.to_wire_string()?);
    }
    if let Some(image) = image {
        form = form.part("image", image_part(image)?);
    }
    Ok(form)
}

#[async_trait(?Send)]
impl PostApi for GalleryClientHttp {
    #[instrument(skip(self, descriptions, image), fields(image = %image.file_name))]
    async fn create_post(
        &self,
        descriptions: PostDescriptions,
        image: ImageUpload,
    ) -> Result<PostMutation, ClientError> {
        if image.is_empty() {
            return Err(ClientError::Validation("Image is required".into()));
        }

        let form = post_form(&descriptions, Some(&image))?;
        let request = self.client.post(self.url("/posts/create")).multipart(form);
        let created: PostMutation = self.send(request, "create_post").await?;

        info!(post_id = %created.post.id, "post created");
        Ok(created)
    }

    async fn get_all_post(&self, query: PageQuery) -> Result<PostPage, ClientError> {
        query.validate()?;
        let request = self
            .client
            .get(self.url("/posts/get-all-post"))
            .query(&query.params());
        let raw: RawPostPage = self.send(request, "get_all_post").await?;
        Ok(raw.into_page(query.page))
    }

    async fn search_posts(&self, text: &str, query: PageQuery) -> Result<PostPage, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::Validation(
                "search query is empty, list posts instead".into(),
            ));
        }
        query.validate()?;

        let request = self
            .client
            .get(self.url("/posts/search"))
            .query(&[("query", text)])
            .query(&query.params());
        let raw: RawPostPage = self.send(request, "search_posts").await?;
        Ok(raw.into_page(query.page))
    }

    #[instrument(skip(self, descriptions, image))]
    async fn update_post(
        &self,
        id: &str,
        descriptions: PostDescriptions,
        image: Option<ImageUpload>,
    ) -> Result<PostMutation, ClientError> {
        let image = image.filter(|img| !img.is_empty());
        let form = post_form(&descriptions, image.as_ref())?;
        let request = self
            .client
            .put(self.url(&format!("/posts/{id}")))
            .multipart(form);
        let updated: PostMutation = self.send(request, "update_post").await?;

        info!(post_id = %updated.post.id, "post updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: &str) -> Result<Acknowledgement, ClientError> {
        let request = self.client.delete(self.url(&format!("/posts/{id}")));
        let ack: Acknowledgement = self.send(request, "delete_post").await?;

        info!(post_id = %id, "post deleted");
        Ok(ack)
    }

    async fn get_post_by_id(&self, id: &str) -> Result<Post, ClientError> {
        let request = self.client.get(self.url(&format!("/posts/{id}")));
        let envelope: PostEnvelope = self.send(request, "get_post_by_id").await?;
        Ok(envelope.post)
    }
}

#[async_trait(?Send)]
impl AuthApi for GalleryClientHttp {
    async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        validate_credentials(email, password)?;

        let request = self.client.post(self.url("/users/login")).json(&json!({
            "email": email.trim(),
            "password": password,
        }));
        let auth: LoginResponse = self.send(request, "login").await?;

        self.session.set(auth.token.clone(), auth.user.clone());
        info!(user_id = %auth.user.id, "logged in");
        Ok(auth)
    }

    async fn update_user(&mut self, id: &str, update: ProfileUpdate) -> Result<User, ClientError> {
        let mut form = Form::new();
        if let Some(name) = update.name {
            form = form.text("name", name);
        }
        if let Some(image) = update.image.as_ref() {
            form = form.part("image", image_part(image)?);
        }

        let request = self
            .client
            .put(self.url(&format!("/users/{id}")))
            .multipart(form);
        let updated: UserMutation = self.send(request, "update_user").await?;

        self.session.set_user(updated.user.clone());
        info!(user_id = %updated.user.id, "profile updated");
        Ok(updated.user)
    }

    async fn change_password(
        &mut self,
        old_password: &str,
        new_password: &str,
    ) -> Result<Acknowledgement, ClientError> {
        validate_password(new_password)?;

        let request = self
            .client
            .patch(self.url("/users/change-password"))
            .json(&json!({
                "oldPassword": old_password,
                "newPassword": new_password,
            }));
        let ack: Acknowledgement = self.send(request, "change_password").await?;

        info!("password changed");
        Ok(ack)
    }

    fn logout(&mut self) {
        self.session.clear();
        info!("logged out");
    }

    fn current_user(&self) -> Option<&User> {
        self.session.user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_follow_login_form_rules() {
        assert!(validate_credentials("admin@example.com", "secret").is_ok());
        assert!(validate_credentials("ADMIN@EXAMPLE.DE", "secret").is_ok());
        assert!(validate_credentials("admin@example", "secret").is_err());
        assert!(validate_credentials("not an email", "secret").is_err());
        assert!(validate_credentials("admin@example.com", "short").is_err());
    }

    #[test]
    fn base_url_is_normalised() {
        let client = GalleryClientHttp::connect("http://localhost:5000/api/", Session::in_memory()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
        assert_eq!(client.url("/posts/7"), "http://localhost:5000/api/posts/7");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(GalleryClientHttp::connect("/", Session::in_memory()).is_err());
    }
}
