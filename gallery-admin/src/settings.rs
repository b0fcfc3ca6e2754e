use gallery_client::http_client::validate_password;
use gallery_client::{AuthApi, ClientError, ImageUpload, ProfileUpdate, User};
use tracing::info;

use crate::notice::Notice;

/// Profile tab of the settings page.
#[derive(Debug)]
pub struct ProfileForm {
    user_id: String,
    stored_name: String,
    name: String,
    image: Option<ImageUpload>,
    notice: Option<Notice>,
}

impl ProfileForm {
    pub fn for_user(user: &User) -> Self {
        let name = user.name.clone().unwrap_or_default();
        Self {
            user_id: user.id.clone(),
            stored_name: name.clone(),
            name,
            image: None,
            notice: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn select_image(&mut self, image: ImageUpload) {
        self.image = Some(image);
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn has_changes(&self) -> bool {
        self.name != self.stored_name || self.image.is_some()
    }

    pub async fn submit<A: AuthApi + ?Sized>(&mut self, api: &mut A) -> Result<User, ClientError> {
        if !self.has_changes() {
            return Err(ClientError::Validation("nothing to update".into()));
        }

        let update = ProfileUpdate {
            name: Some(self.name.clone()),
            image: self.image.clone(),
        };
        match api.update_user(&self.user_id, update).await {
            Ok(user) => {
                info!(user_id = %user.id, "profile form saved");
                *self = Self::for_user(&user);
                self.notice = Some(Notice::success("Profile updated successfully"));
                Ok(user)
            }
            Err(err) => {
                self.notice = Some(Notice::from_error("Failed to update profile", &err));
                Err(err)
            }
        }
    }
}

/// Password tab of the settings page.
#[derive(Debug, Default)]
pub struct PasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
    notice: Option<Notice>,
}

impl PasswordForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.old_password.is_empty() {
            return Err(ClientError::Validation("Current password is required".into()));
        }
        validate_password(&self.new_password)?;
        if self.new_password != self.confirm_password {
            return Err(ClientError::Validation("Passwords do not match".into()));
        }
        Ok(())
    }

    pub async fn submit<A: AuthApi + ?Sized>(&mut self, api: &mut A) -> Result<(), ClientError> {
        let result = match self.validate() {
            Ok(()) => api
                .change_password(&self.old_password, &self.new_password)
                .await
                .map(|_| ()),
            Err(err) => Err(err),
        };

        match &result {
            Ok(()) => {
                *self = Self::new();
                self.notice = Some(Notice::success("Password changed successfully"));
            }
            Err(err) => self.notice = Some(Notice::from_error("Failed to change password", err)),
        }
        result
    }
}
