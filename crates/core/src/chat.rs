//! Chat formatting carried by groups and players

use warden_document::Document;
use warden_store::{optional, SerializationError};

const PREFIX_KEY: &str = "chat_prefix";
const COLOR_KEY: &str = "chat_color";
const TABLIST_KEY: &str = "tablist_color";

/// Prefix and colours shown next to a holder's name.
///
/// Colours are opaque names (`"gold"`, `"#ffaa00"`); rendering them is up to
/// the chat layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatStyle {
    pub prefix: Option<String>,
    pub color: Option<String>,
    pub tablist_color: Option<String>,
}

impl ChatStyle {
    pub fn is_empty(&self) -> bool {
        self.prefix.is_none() && self.color.is_none() && self.tablist_color.is_none()
    }

    pub(crate) fn write(&self, document: &mut Document) {
        document.insert(PREFIX_KEY, self.prefix.clone());
        document.insert(COLOR_KEY, self.color.clone());
        document.insert(TABLIST_KEY, self.tablist_color.clone());
    }

    pub(crate) fn read(document: &Document) -> Result<Self, SerializationError> {
        Ok(Self {
            prefix: optional(document, PREFIX_KEY)?,
            color: optional(document, COLOR_KEY)?,
            tablist_color: optional(document, TABLIST_KEY)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_written_flat() {
        let style = ChatStyle {
            prefix: Some("[Mod]".into()),
            color: Some("green".into()),
            tablist_color: None,
        };
        let mut doc = Document::new();
        style.write(&mut doc);

        assert_eq!(doc.get_as::<String>("chat_prefix"), Ok(Some("[Mod]".into())));
        assert_eq!(ChatStyle::read(&doc).unwrap(), style);
        assert!(ChatStyle::read(&Document::new()).unwrap().is_empty());
    }
}
