//! Decoding and language fallback for stored description blocks.
//!
//! The backend stores each language block either as a JSON object or as a
//! JSON-encoded string. Decoding happens once, while a [`Post`] is
//! deserialized, and never fails: a corrupt block turns into sentinel text so
//! a single broken post cannot take down a whole page of results.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::models::{DescriptionBlock, Locale, Post, Slot};

/// Placeholder shown for a slot whose stored content cannot be read.
pub const SENTINEL: &str = "Content unavailable";

impl DescriptionBlock {
    /// Block with every slot set to [`SENTINEL`].
    pub fn sentinel() -> Self {
        let mut block = DescriptionBlock::default();
        for slot in Slot::ALL {
            block.set(slot, SENTINEL);
        }
        block
    }

    /// Decodes a stored block. `None` means the block is absent.
    pub fn from_wire(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Object(map) => Some(Self::from_object(map)),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Null) => None,
                Ok(Value::Object(map)) => Some(Self::from_object(&map)),
                Ok(_) | Err(_) => {
                    warn!("stored description block is not a JSON object");
                    Some(Self::sentinel())
                }
            },
            _ => {
                warn!("stored description block has unexpected type");
                Some(Self::sentinel())
            }
        }
    }

    fn from_object(map: &Map<String, Value>) -> Self {
        let mut block = DescriptionBlock::default();
        for slot in Slot::ALL {
            let text = match map.get(slot.label()) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(_) => SENTINEL.to_string(),
            };
            block.set(slot, text);
        }
        block
    }
}

pub(crate) fn required_block<'de, D>(deserializer: D) -> Result<DescriptionBlock, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(DescriptionBlock::from_wire)
        .unwrap_or_default())
}

pub(crate) fn optional_block<'de, D>(deserializer: D) -> Result<Option<DescriptionBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(DescriptionBlock::from_wire))
}

/// Block to display for `post` in `locale`, falling back to English when the
/// German block is absent.
pub fn resolve_descriptions(post: &Post, locale: Locale) -> DescriptionBlock {
    match locale {
        Locale::En => post.descriptions_en.clone(),
        Locale::De => post
            .descriptions_de
            .clone()
            .unwrap_or_else(|| post.descriptions_en.clone()),
    }
}

/// Same resolution over raw stored values.
pub fn resolve_wire(en: Option<&Value>, de: Option<&Value>, locale: Locale) -> DescriptionBlock {
    let selected = match locale {
        Locale::En => en,
        Locale::De => de,
    };

    match selected.and_then(DescriptionBlock::from_wire) {
        Some(block) => block,
        // single level of fallback
        None if locale == Locale::De => resolve_wire(en, None, Locale::En),
        None => DescriptionBlock::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post_from(value: Value) -> Post {
        serde_json::from_value(value).expect("post deserializes")
    }

    fn has_all_slots(block: &DescriptionBlock) -> bool {
        let value = serde_json::to_value(block).unwrap();
        Slot::ALL
            .iter()
            .all(|slot| value.get(slot.label()).and_then(Value::as_str).is_some())
    }

    #[test]
    fn german_falls_back_to_english_when_absent() {
        let post = post_from(json!({
            "id": "1",
            "descriptions_en": {"AI": "a", "Child": "c", "Teenager": "t", "Adult Expert": "x"}
        }));
        assert_eq!(
            resolve_descriptions(&post, Locale::De),
            resolve_descriptions(&post, Locale::En)
        );
    }

    #[test]
    fn german_null_also_falls_back() {
        let post = post_from(json!({
            "id": "1",
            "descriptions_en": "{\"AI\":\"a\"}",
            "descriptions_de": null
        }));
        assert_eq!(resolve_descriptions(&post, Locale::De).ai, "a");
    }

    #[test]
    fn german_block_is_used_when_present() {
        let post = post_from(json!({
            "id": "1",
            "descriptions_en": {"AI": "hello"},
            "descriptions_de": "{\"AI\":\"hallo\"}"
        }));
        assert_eq!(resolve_descriptions(&post, Locale::De).ai, "hallo");
        assert_eq!(resolve_descriptions(&post, Locale::En).ai, "hello");
    }

    #[test]
    fn malformed_json_yields_sentinel_block() {
        let post = post_from(json!({
            "id": "1",
            "descriptions_en": "{\"AI\": broken",
            "descriptions_de": "[not json"
        }));
        assert_eq!(resolve_descriptions(&post, Locale::En), DescriptionBlock::sentinel());
        assert_eq!(resolve_descriptions(&post, Locale::De), DescriptionBlock::sentinel());
    }

    #[test]
    fn partial_and_odd_inputs_always_have_four_slots() {
        let inputs = [
            json!({"AI": "only ai"}),
            json!({"Child": 7, "Teenager": null}),
            json!("{\"Adult Expert\":\"x\"}"),
            json!("42"),
            json!(true),
            json!([1, 2]),
            json!({}),
            json!(""),
        ];
        for input in inputs {
            for locale in Locale::ALL {
                let block = resolve_wire(Some(&input), Some(&input), locale);
                assert!(has_all_slots(&block), "{input} / {locale}");
            }
        }
    }

    #[test]
    fn missing_slots_become_empty_and_bad_slots_become_sentinel() {
        let block = DescriptionBlock::from_wire(&json!({"AI": "ok", "Child": 3})).unwrap();
        assert_eq!(block.ai, "ok");
        assert_eq!(block.child, SENTINEL);
        assert_eq!(block.teenager, "");
        assert_eq!(block.adult_expert, "");
    }

    #[test]
    fn wire_resolution_falls_back_one_level_only() {
        let en = json!({"AI": "en"});
        assert_eq!(resolve_wire(Some(&en), None, Locale::De).ai, "en");
        assert_eq!(resolve_wire(None, None, Locale::De), DescriptionBlock::default());
        assert_eq!(
            resolve_wire(Some(&json!("{oops")), None, Locale::De),
            DescriptionBlock::sentinel()
        );
    }

    #[test]
    fn missing_english_block_is_empty_not_an_error() {
        let post = post_from(json!({"id": "1"}));
        assert_eq!(post.descriptions_en, DescriptionBlock::default());
    }
}
