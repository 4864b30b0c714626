//! Output blocks of the target document model.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::annotations::RichText;

/// Language recorded on code blocks whose fence carries no info string.
pub const PLAIN_TEXT_LANGUAGE: &str = "plain text";

/// One block of the target document model.
///
/// Every variant except [`Block::Divider`] carries at least one span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph { rich_text: Vec<RichText> },
    Heading1 { rich_text: Vec<RichText> },
    Heading2 { rich_text: Vec<RichText> },
    Heading3 { rich_text: Vec<RichText> },
    BulletedListItem { rich_text: Vec<RichText> },
    NumberedListItem { rich_text: Vec<RichText> },
    Quote { rich_text: Vec<RichText> },
    Code { rich_text: Vec<RichText>, language: String },
    Divider,
}

impl Block {
    /// Position-preserving blank paragraph.
    pub fn placeholder() -> Self {
        Block::Paragraph {
            rich_text: vec![RichText::blank()],
        }
    }

    /// The target API's type tag for this block.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Paragraph { .. } => "paragraph",
            Block::Heading1 { .. } => "heading_1",
            Block::Heading2 { .. } => "heading_2",
            Block::Heading3 { .. } => "heading_3",
            Block::BulletedListItem { .. } => "bulleted_list_item",
            Block::NumberedListItem { .. } => "numbered_list_item",
            Block::Quote { .. } => "quote",
            Block::Code { .. } => "code",
            Block::Divider => "divider",
        }
    }

    /// The block's span list; `None` for dividers.
    pub fn rich_text(&self) -> Option<&[RichText]> {
        match self {
            Block::Paragraph { rich_text }
            | Block::Heading1 { rich_text }
            | Block::Heading2 { rich_text }
            | Block::Heading3 { rich_text }
            | Block::BulletedListItem { rich_text }
            | Block::NumberedListItem { rich_text }
            | Block::Quote { rich_text }
            | Block::Code { rich_text, .. } => Some(rich_text),
            Block::Divider => None,
        }
    }

    /// Concatenated span contents, mainly for diagnostics and tests.
    pub fn plain_text(&self) -> String {
        self.rich_text()
            .map(|spans| spans.iter().map(|s| s.content.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Encodes as `{"object":"block","type":kind,kind:{..payload}}`.
impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct TextPayload<'a> {
            rich_text: &'a [RichText],
        }

        #[derive(Serialize)]
        struct CodePayload<'a> {
            rich_text: &'a [RichText],
            language: &'a str,
        }

        #[derive(Serialize)]
        struct Empty {}

        let kind = self.kind();
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("object", "block")?;
        map.serialize_entry("type", kind)?;
        match self {
            Block::Code {
                rich_text,
                language,
            } => map.serialize_entry(
                kind,
                &CodePayload {
                    rich_text,
                    language,
                },
            )?,
            Block::Divider => map.serialize_entry(kind, &Empty {})?,
            other => {
                let rich_text = other.rich_text().unwrap_or_default();
                map.serialize_entry(kind, &TextPayload { rich_text })?
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paragraph_encodes_with_type_tag_and_payload() {
        let block = Block::Paragraph {
            rich_text: vec![RichText::plain("hello")],
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["object"], "block");
        assert_eq!(value["type"], "paragraph");
        assert_eq!(value["paragraph"]["rich_text"][0]["text"]["content"], "hello");
    }

    #[test]
    fn code_carries_language() {
        let block = Block::Code {
            rich_text: vec![RichText::plain("fn main() {}")],
            language: "rust".into(),
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["code"]["language"], "rust");
    }

    #[test]
    fn divider_payload_is_empty_object() {
        let value = serde_json::to_value(Block::Divider).unwrap();
        assert_eq!(
            value,
            json!({"object": "block", "type": "divider", "divider": {}})
        );
    }

    #[test]
    fn placeholder_is_single_space_paragraph() {
        assert_eq!(Block::placeholder().plain_text(), " ");
        assert_eq!(Block::placeholder().kind(), "paragraph");
    }
}
