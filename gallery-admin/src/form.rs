//! Create and edit flow for bilingual posts.
//!
//! Creating walks through English, then German, then submission. Editing
//! shows both languages at once. Every keystroke lands in a buffer keyed by
//! `(locale, slot)`, so switching languages mid-edit never loses text.

use std::collections::HashMap;
use std::fmt;

use gallery_client::{
    ClientError, DescriptionBlock, ImageUpload, Locale, Post, PostApi, PostDescriptions,
    PostMutation, Slot,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::notice::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStage {
    CollectingEn,
    CollectingDe,
    ReadyToSubmit,
    Editing,
}

impl fmt::Display for FormStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormStage::CollectingEn => "collecting English",
            FormStage::CollectingDe => "collecting German",
            FormStage::ReadyToSubmit => "ready to submit",
            FormStage::Editing => "editing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("cannot {action} while {stage}")]
    InvalidTransition {
        stage: FormStage,
        action: &'static str,
    },
    #[error("Image is required")]
    ImageRequired,
    #[error("{0} descriptions are required")]
    MissingDescriptions(Locale),
    #[error("{slot} description is required")]
    SlotRequired { locale: Locale, slot: Slot },
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug)]
pub struct FormController {
    mode: FormMode,
    stage: FormStage,
    active_locale: Locale,
    buffer: HashMap<(Locale, Slot), String>,
    image: Option<ImageUpload>,
    existing_image: Option<String>,
    notice: Option<Notice>,
}

impl Default for FormController {
    fn default() -> Self {
        Self::create()
    }
}

impl FormController {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            stage: FormStage::CollectingEn,
            active_locale: Locale::En,
            buffer: HashMap::new(),
            image: None,
            existing_image: None,
            notice: None,
        }
    }

    /// Loads `post` for editing. The German buffer is only seeded when the
    /// post has a German block.
    pub fn edit(post: &Post) -> Self {
        let mut form = Self {
            mode: FormMode::Edit {
                id: post.id.clone(),
            },
            stage: FormStage::Editing,
            ..Self::create()
        };
        form.seed(post);
        form
    }

    fn seed(&mut self, post: &Post) {
        self.buffer.clear();
        self.load_block(Locale::En, &post.descriptions_en);
        if let Some(de) = &post.descriptions_de {
            self.load_block(Locale::De, de);
        }
        self.existing_image = post.image.clone();
        self.image = None;
    }

    fn load_block(&mut self, locale: Locale, block: &DescriptionBlock) {
        for (slot, text) in block.iter() {
            self.buffer.insert((locale, slot), text.to_string());
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn stage(&self) -> FormStage {
        self.stage
    }

    pub fn active_locale(&self) -> Locale {
        self.active_locale
    }

    pub fn image(&self) -> Option<&ImageUpload> {
        self.image.as_ref()
    }

    /// Image already stored for the post being edited.
    pub fn existing_image(&self) -> Option<&str> {
        self.existing_image.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_field(&mut self, slot: Slot, text: impl Into<String>) {
        self.buffer.insert((self.active_locale, slot), text.into());
    }

    pub fn field(&self, slot: Slot) -> &str {
        self.field_in(self.active_locale, slot)
    }

    pub fn field_in(&self, locale: Locale, slot: Slot) -> &str {
        self.buffer
            .get(&(locale, slot))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Fields shown for the active locale, always read from the buffer.
    pub fn visible_fields(&self) -> DescriptionBlock {
        self.block(self.active_locale)
    }

    pub fn block(&self, locale: Locale) -> DescriptionBlock {
        let mut block = DescriptionBlock::default();
        for slot in Slot::ALL {
            block.set(slot, self.field_in(locale, slot));
        }
        block
    }

    fn has_locale(&self, locale: Locale) -> bool {
        self.buffer.keys().any(|(l, _)| *l == locale)
    }

    pub fn select_image(&mut self, image: ImageUpload) {
        self.image = Some(image);
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn switch_locale(&mut self, locale: Locale) {
        debug!(from = %self.active_locale, to = %locale, "form locale switched");
        self.active_locale = locale;
    }

    /// Step one of the create flow: keep the English text and move on to
    /// German. Every English slot must be filled; the image is not checked
    /// yet.
    pub fn next_step(&mut self) -> Result<(), FormError> {
        if self.mode != FormMode::Create || self.stage != FormStage::CollectingEn {
            return Err(FormError::InvalidTransition {
                stage: self.stage,
                action: "advance to the German step",
            });
        }
        self.require_english()?;
        self.active_locale = Locale::De;
        self.stage = FormStage::CollectingDe;
        Ok(())
    }

    /// Back from the German step to English, keeping both buffers.
    pub fn previous_step(&mut self) -> Result<(), FormError> {
        if self.stage != FormStage::CollectingDe {
            return Err(FormError::InvalidTransition {
                stage: self.stage,
                action: "go back to the English step",
            });
        }
        self.active_locale = Locale::En;
        self.stage = FormStage::CollectingEn;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<(), FormError> {
        if self.stage != FormStage::CollectingDe {
            return Err(FormError::InvalidTransition {
                stage: self.stage,
                action: "finish",
            });
        }
        self.stage = FormStage::ReadyToSubmit;
        Ok(())
    }

    fn require_english(&self) -> Result<(), FormError> {
        match Slot::ALL
            .into_iter()
            .find(|slot| self.field_in(Locale::En, *slot).trim().is_empty())
        {
            Some(slot) => Err(FormError::SlotRequired {
                locale: Locale::En,
                slot,
            }),
            None => Ok(()),
        }
    }

    /// Merges both language buffers into the request payload. Only a
    /// finished create form or an edit form can be submitted.
    pub fn build_submission(&self) -> Result<(PostDescriptions, Option<ImageUpload>), FormError> {
        if !matches!(self.stage, FormStage::ReadyToSubmit | FormStage::Editing) {
            return Err(FormError::InvalidTransition {
                stage: self.stage,
                action: "submit",
            });
        }
        if !self.has_locale(Locale::En) {
            return Err(FormError::MissingDescriptions(Locale::En));
        }
        if self.mode == FormMode::Create {
            self.require_english()?;
        }

        let image = self.image.clone().filter(|img| !img.is_empty());
        if self.mode == FormMode::Create && image.is_none() {
            return Err(FormError::ImageRequired);
        }

        let descriptions = PostDescriptions {
            en: self.block(Locale::En),
            de: self
                .has_locale(Locale::De)
                .then(|| self.block(Locale::De)),
        };
        Ok((descriptions, image))
    }

    /// Sends the form. A created post resets the form; an edited post is
    /// reloaded from the response.
    pub async fn submit<A: PostApi + ?Sized>(&mut self, api: &A) -> Result<PostMutation, FormError> {
        let result = self.send(api).await;
        match &result {
            Ok(saved) => {
                let message = saved
                    .message
                    .clone()
                    .unwrap_or_else(|| "Post saved successfully".into());
                info!(post_id = %saved.post.id, "post form submitted");
                match self.mode {
                    FormMode::Create => *self = Self::create(),
                    FormMode::Edit { .. } => self.seed(&saved.post),
                }
                self.notice = Some(Notice::success(message));
            }
            Err(FormError::Client(err)) => {
                self.notice = Some(Notice::from_error("Failed to save post", err));
            }
            Err(other) => {
                self.notice = Some(Notice::error(other.to_string()));
            }
        }
        result
    }

    async fn send<A: PostApi + ?Sized>(&self, api: &A) -> Result<PostMutation, FormError> {
        let (descriptions, image) = self.build_submission()?;
        let saved = match (&self.mode, image) {
            (FormMode::Create, Some(image)) => api.create_post(descriptions, image).await?,
            (FormMode::Create, None) => return Err(FormError::ImageRequired),
            (FormMode::Edit { id }, image) => api.update_post(id, descriptions, image).await?,
        };
        Ok(saved)
    }
}
