use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::descriptions;
use crate::error::ClientError;

/// Content language of a description block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::De];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            other => Err(ClientError::Validation(format!(
                "unsupported language: {other}"
            ))),
        }
    }
}

/// Audience category of a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "AI")]
    Ai,
    Child,
    Teenager,
    #[serde(rename = "Adult Expert")]
    AdultExpert,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Ai, Slot::Child, Slot::Teenager, Slot::AdultExpert];

    /// Key used for the slot in stored description objects.
    pub fn label(self) -> &'static str {
        match self {
            Slot::Ai => "AI",
            Slot::Child => "Child",
            Slot::Teenager => "Teenager",
            Slot::AdultExpert => "Adult Expert",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Slot {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Slot::ALL
            .into_iter()
            .find(|slot| {
                slot.label().eq_ignore_ascii_case(wanted)
                    || slot.label().replace(' ', "-").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ClientError::Validation(format!("unknown category: {wanted}")))
    }
}

/// The four-slot description object for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionBlock {
    #[serde(rename = "AI", default)]
    pub ai: String,
    #[serde(rename = "Child", default)]
    pub child: String,
    #[serde(rename = "Teenager", default)]
    pub teenager: String,
    #[serde(rename = "Adult Expert", default)]
    pub adult_expert: String,
}

impl DescriptionBlock {
    pub fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::Ai => &self.ai,
            Slot::Child => &self.child,
            Slot::Teenager => &self.teenager,
            Slot::AdultExpert => &self.adult_expert,
        }
    }

    pub fn set(&mut self, slot: Slot, text: impl Into<String>) {
        let text = text.into();
        match slot {
            Slot::Ai => self.ai = text,
            Slot::Child => self.child = text,
            Slot::Teenager => self.teenager = text,
            Slot::AdultExpert => self.adult_expert = text,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &str)> {
        Slot::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }

    /// JSON string form expected by the multipart endpoints.
    pub fn to_wire_string(&self) -> Result<String, ClientError> {
        serde_json::to_string(self)
            .map_err(|e| ClientError::Validation(format!("cannot encode descriptions: {e}")))
    }
}

/// Description payload sent on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDescriptions {
    pub en: DescriptionBlock,
    pub de: Option<DescriptionBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Display)]
#[display("Post {{ id: {id} }}")]
#[serde(try_from = "WirePost")]
pub struct Post {
    pub id: String,
    pub image: Option<String>,
    pub descriptions_en: DescriptionBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptions_de: Option<DescriptionBlock>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Post as stored by the backend. Documents may carry `id`, `_id` or both.
#[derive(Debug, Deserialize)]
struct WirePost {
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "_id", default)]
    object_id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    image: Option<String>,
    #[serde(default, deserialize_with = "descriptions::required_block")]
    descriptions_en: DescriptionBlock,
    #[serde(default, deserialize_with = "descriptions::optional_block")]
    descriptions_de: Option<DescriptionBlock>,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient_timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<WirePost> for Post {
    type Error = String;

    fn try_from(wire: WirePost) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .as_ref()
            .and_then(id_text)
            .or_else(|| wire.object_id.as_ref().and_then(id_text))
            .ok_or_else(|| "post has no usable id".to_string())?;
        Ok(Post {
            id,
            image: wire.image,
            descriptions_en: wire.descriptions_en,
            descriptions_de: wire.descriptions_de,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        // extended JSON: {"$oid": "..."}
        Value::Object(map) => map.get("$oid").and_then(id_text),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).map(str::to_string))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

/// One page of posts as returned by the list and search endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostPage {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_posts: u64,
    pub next_page: bool,
    pub posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawPostPage {
    #[serde(default)]
    posts: Vec<Value>,
    current_page: Option<u32>,
    total_pages: Option<u32>,
    total_posts: Option<u64>,
    next_page: Option<bool>,
}

impl RawPostPage {
    pub(crate) fn into_page(self, requested_page: u32) -> PostPage {
        let total_posts = self.total_posts.unwrap_or(self.posts.len() as u64);
        let posts = self
            .posts
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Post>(value) {
                Ok(post) => Some(post),
                Err(err) => {
                    warn!(error = %err, "skipping undecodable post");
                    None
                }
            })
            .collect();
        PostPage {
            current_page: self.current_page.unwrap_or(requested_page),
            total_pages: self.total_pages.unwrap_or(1),
            total_posts,
            next_page: self.next_page.unwrap_or(false),
            posts,
        }
    }
}

/// Pagination parameters shared by the list and search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
    pub language: Locale,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 5,
            language: Locale::En,
        }
    }
}

impl PageQuery {
    pub fn new(page: u32, limit: u32, language: Locale) -> Self {
        Self {
            page,
            limit,
            language,
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.page < 1 {
            return Err(ClientError::Validation("page must be at least 1".into()));
        }
        if self.limit == 0 {
            return Err(ClientError::Validation("limit must be positive".into()));
        }
        Ok(())
    }

    pub(crate) fn params(&self) -> [(&'static str, String); 3] {
        [
            ("language", self.language.to_string()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// Binary image attached to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostMutation {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub post: Post,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostEnvelope {
    pub post: Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("User {{ id: {id} }}")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserMutation {
    #[serde(default)]
    pub success: bool,
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

/// Fields of a profile update; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub image: Option<ImageUpload>,
}
