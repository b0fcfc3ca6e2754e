//! View controllers for the gallery admin dashboard and the public gallery.
//!
//! Controllers own their view state and talk to the backend through the
//! [`gallery_client::PostApi`] and [`gallery_client::AuthApi`] traits.

pub mod debounce;
pub mod form;
pub mod gallery;
pub mod list;
pub mod notice;
pub mod sequencer;
pub mod settings;

#[cfg(test)]
mod testing;

pub use debounce::Debouncer;
pub use form::{FormController, FormError, FormMode, FormStage};
pub use gallery::GalleryView;
pub use list::{Applied, FetchKind, FetchPlan, ListController, truncate_preview};
pub use notice::{Notice, NoticeLevel};
pub use sequencer::{RequestSequencer, RequestToken};
pub use settings::{PasswordForm, ProfileForm};
