//! The flat wire representation: plain text plus offset/length entities.
//!
//! This shape (including the `MessageEntity…` type strings and the
//! `userId`/`documentId`/`canCollapse` field names) is the interchange format
//! with the messaging backend and must serialize exactly as named here.
//! Offsets and lengths are UTF-16 code units of `text`.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Formatted text as the messaging protocol carries it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFormattedText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<ApiMessageEntity>,
}

impl ApiFormattedText {
    pub fn plain(text: impl Into<String>) -> Self {
        ApiFormattedText {
            text: text.into(),
            entities: Vec::new(),
        }
    }
}

/// One formatting annotation over the text.
///
/// Entities may nest strictly but must not partially overlap; when two start
/// at the same offset, the longer one is the ancestor. Violations are dropped
/// (with a warning) by the converter rather than propagated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessageEntity {
    #[serde(rename = "type")]
    pub kind: ApiMessageEntityType,
    pub offset: u32,
    pub length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(
        rename = "documentId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub document_id: Option<String>,
    #[serde(
        rename = "canCollapse",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub can_collapse: Option<bool>,
}

impl ApiMessageEntity {
    /// An entity with just the common fields; extras default to `None`.
    pub fn new(kind: ApiMessageEntityType, offset: u32, length: u32) -> Self {
        ApiMessageEntity {
            kind,
            offset,
            length,
            language: None,
            url: None,
            user_id: None,
            document_id: None,
            can_collapse: None,
        }
    }

    /// Saturates on overflow; an end past `u32::MAX` can only come from
    /// malformed wire data, and the saturated value still fails the
    /// converter's range check so the entity gets dropped.
    pub(crate) fn end(&self) -> u32 {
        self.offset.saturating_add(self.length)
    }
}

/// The protocol's entity type tags.
///
/// Unrecognized tags deserialize as [`ApiMessageEntityType::Unknown`] so that
/// a newer server can't break parsing; the converter degrades unknown
/// entities to plain text.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApiMessageEntityType {
    Bold,
    Italic,
    Underline,
    Strike,
    Spoiler,
    Blockquote,
    Code,
    Pre,
    TextUrl,
    MentionName,
    CustomEmoji,
    Unknown,
}

impl ApiMessageEntityType {
    pub fn wire_name(self) -> &'static str {
        match self {
            ApiMessageEntityType::Bold => "MessageEntityBold",
            ApiMessageEntityType::Italic => "MessageEntityItalic",
            ApiMessageEntityType::Underline => "MessageEntityUnderline",
            ApiMessageEntityType::Strike => "MessageEntityStrike",
            ApiMessageEntityType::Spoiler => "MessageEntitySpoiler",
            ApiMessageEntityType::Blockquote => "MessageEntityBlockquote",
            ApiMessageEntityType::Code => "MessageEntityCode",
            ApiMessageEntityType::Pre => "MessageEntityPre",
            ApiMessageEntityType::TextUrl => "MessageEntityTextUrl",
            ApiMessageEntityType::MentionName => "MessageEntityMentionName",
            ApiMessageEntityType::CustomEmoji => "MessageEntityCustomEmoji",
            ApiMessageEntityType::Unknown => "MessageEntityUnknown",
        }
    }

    fn from_wire_name(name: &str) -> Self {
        match name {
            "MessageEntityBold" => ApiMessageEntityType::Bold,
            "MessageEntityItalic" => ApiMessageEntityType::Italic,
            "MessageEntityUnderline" => ApiMessageEntityType::Underline,
            "MessageEntityStrike" => ApiMessageEntityType::Strike,
            "MessageEntitySpoiler" => ApiMessageEntityType::Spoiler,
            "MessageEntityBlockquote" => ApiMessageEntityType::Blockquote,
            "MessageEntityCode" => ApiMessageEntityType::Code,
            "MessageEntityPre" => ApiMessageEntityType::Pre,
            "MessageEntityTextUrl" => ApiMessageEntityType::TextUrl,
            "MessageEntityMentionName" => ApiMessageEntityType::MentionName,
            "MessageEntityCustomEmoji" => ApiMessageEntityType::CustomEmoji,
            _ => ApiMessageEntityType::Unknown,
        }
    }
}

impl Serialize for ApiMessageEntityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for ApiMessageEntityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ApiMessageEntityType::from_wire_name(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn entity_serializes_with_wire_names() {
        let mut entity = ApiMessageEntity::new(ApiMessageEntityType::MentionName, 6, 5);
        entity.user_id = Some("123".to_string());
        let json = serde_json::to_string(&entity).unwrap();
        assert_eq!(
            json,
            r#"{"type":"MessageEntityMentionName","offset":6,"length":5,"userId":"123"}"#
        );
    }

    #[test]
    fn formatted_text_without_entities_omits_the_field() {
        let api = ApiFormattedText::plain("hi");
        assert_eq!(serde_json::to_string(&api).unwrap(), r#"{"text":"hi"}"#);
    }

    #[test]
    fn entities_field_defaults_to_empty() {
        let api: ApiFormattedText = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(api.entities, vec![]);
    }

    #[test]
    fn unknown_entity_type_round_trips_as_unknown() {
        let json = r#"{"type":"MessageEntityBankCard","offset":0,"length":4}"#;
        let entity: ApiMessageEntity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.kind, ApiMessageEntityType::Unknown);
    }

    #[test]
    fn pre_entity_with_language() {
        let json = r#"{"type":"MessageEntityPre","offset":0,"length":13,"language":"typescript"}"#;
        let entity: ApiMessageEntity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.kind, ApiMessageEntityType::Pre);
        assert_eq!(entity.language.as_deref(), Some("typescript"));
    }

    #[test]
    fn can_collapse_round_trips() {
        let mut entity = ApiMessageEntity::new(ApiMessageEntityType::Blockquote, 0, 3);
        entity.can_collapse = Some(true);
        let json = serde_json::to_string(&entity).unwrap();
        let back: ApiMessageEntity = serde_json::from_str(&json).unwrap();
        assert_eq!(back.can_collapse, Some(true));
    }
}
