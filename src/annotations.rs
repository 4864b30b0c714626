//! Annotation model and rich-text spans.
//!
//! Every span owns its own [`Annotations`] value. Formatting wrappers only ever switch
//! flags on: [`Annotations::merge`] is a flag-wise OR, so a flag that is `true` stays
//! `true` however many wrappers enclose it.

use serde::{Deserialize, Serialize};

/// Color every unformatted span carries.
pub const DEFAULT_COLOR: &str = "default";

/// One formatting flag of [`Annotations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Bold,
    Italic,
    Strikethrough,
    Underline,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: String,
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            code: false,
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

impl Annotations {
    /// Flag-wise OR of `self` and `other`. The color of `self` is kept unless it is the
    /// default, in which case `other`'s color wins.
    pub fn merge(&self, other: &Annotations) -> Annotations {
        Annotations {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            strikethrough: self.strikethrough || other.strikethrough,
            underline: self.underline || other.underline,
            code: self.code || other.code,
            color: if self.color == DEFAULT_COLOR {
                other.color.clone()
            } else {
                self.color.clone()
            },
        }
    }

    /// Returns these annotations with `flag` switched on.
    pub fn with(mut self, flag: Flag) -> Annotations {
        match flag {
            Flag::Bold => self.bold = true,
            Flag::Italic => self.italic = true,
            Flag::Strikethrough => self.strikethrough = true,
            Flag::Underline => self.underline = true,
            Flag::Code => self.code = true,
        }
        self
    }

    pub fn is_default(&self) -> bool {
        *self == Annotations::default()
    }
}

/// Hyperlink target attached to a span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

/// A run of text sharing one set of annotations and an optional link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichText {
    pub content: String,
    pub link: Option<Link>,
    pub annotations: Annotations,
}

impl RichText {
    /// Unformatted, unlinked span.
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            link: None,
            annotations: Annotations::default(),
        }
    }

    /// Placeholder span used wherever a block would otherwise carry no text.
    pub fn blank() -> Self {
        Self::plain(" ")
    }

    pub fn newline() -> Self {
        Self::plain("\n")
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.annotations = self.annotations.merge(&Annotations::default().with(flag));
        self
    }

    pub fn with_link(mut self, url: &str) -> Self {
        self.link = Some(Link {
            url: url.to_string(),
        });
        self
    }
}

/// Target-API encoding of a span: `{"type":"text","text":{..},"annotations":{..}}`.
impl Serialize for RichText {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct TextPayload<'a> {
            content: &'a str,
            link: Option<&'a Link>,
        }

        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "type")]
            kind: &'static str,
            text: TextPayload<'a>,
            annotations: &'a Annotations,
        }

        Wire {
            kind: "text",
            text: TextPayload {
                content: &self.content,
                link: self.link.as_ref(),
            },
            annotations: &self.annotations,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_annotations_are_unformatted() {
        let a = Annotations::default();
        assert!(!a.bold && !a.italic && !a.strikethrough && !a.underline && !a.code);
        assert_eq!(a.color, "default");
        assert!(a.is_default());
    }

    #[test]
    fn merge_never_clears_a_flag() {
        let bold = Annotations::default().with(Flag::Bold);
        let merged = bold.merge(&Annotations::default());
        assert!(merged.bold);
        let merged = Annotations::default().merge(&bold);
        assert!(merged.bold);
    }

    #[test]
    fn with_flag_is_idempotent() {
        let span = RichText::plain("x").with_flag(Flag::Bold).with_flag(Flag::Bold);
        assert!(span.annotations.bold);
        assert!(!span.annotations.italic);
    }

    #[test]
    fn flagging_one_span_leaves_its_source_untouched() {
        let original = RichText::plain("x");
        let bold = original.clone().with_flag(Flag::Bold);
        assert!(bold.annotations.bold);
        assert!(original.annotations.is_default());
    }

    #[test]
    fn serialises_to_text_object() {
        let span = RichText::plain("hi").with_link("https://example.com");
        let json = serde_json::to_value(&span).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"]["content"], "hi");
        assert_eq!(json["text"]["link"]["url"], "https://example.com");
        assert_eq!(json["annotations"]["color"], "default");

        let json = serde_json::to_value(RichText::plain("x")).unwrap();
        assert!(json["text"]["link"].is_null());
    }
}
