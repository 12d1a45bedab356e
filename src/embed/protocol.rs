//! Cross-window message schema.
//!
//! The hosted frame and the host page talk through structured messages on
//! an open channel shared with every other script on the page, so inbound
//! data is validated strictly: anything that is not exactly a size message
//! from this system is ignored, never an error.

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

/// Tag identifying messages produced by this system.
pub const MESSAGE_SOURCE: &str = "chatframe";

/// The only message kind currently in the protocol.
pub const SIZE_KIND: &str = "size";

/// Height report from the hosted frame to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeMessage {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub height: u32,
}

impl SizeMessage {
    pub fn new(height: u32) -> Self {
        Self {
            source: MESSAGE_SOURCE.to_string(),
            kind: SIZE_KIND.to_string(),
            height,
        }
    }

    /// Strict shape check over untrusted inbound data. `None` for
    /// anything that is not our size message.
    pub fn parse(data: &serde_json::Value) -> Option<Self> {
        let obj = data.as_object()?;
        if obj.get("source")?.as_str()? != MESSAGE_SOURCE {
            return None;
        }
        if obj.get("type")?.as_str()? != SIZE_KIND {
            return None;
        }
        let height = u32::try_from(obj.get("height")?.as_u64()?).ok()?;
        Some(Self::new(height))
    }
}

/// One inbound window message: the payload plus the frame that sent it,
/// standing in for the event's source window.
#[derive(Debug, Clone)]
pub struct MessageEnvelope {
    pub sender: NodeId,
    pub data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn well_formed_size_message_parses() {
        let parsed = SizeMessage::parse(&json!({
            "source": "chatframe",
            "type": "size",
            "height": 420
        }));
        assert_eq!(parsed, Some(SizeMessage::new(420)));
    }

    #[test]
    fn foreign_source_is_ignored() {
        assert!(SizeMessage::parse(&json!({
            "source": "someone-else",
            "type": "size",
            "height": 420
        }))
        .is_none());
    }

    #[test]
    fn wrong_kind_is_ignored() {
        assert!(SizeMessage::parse(&json!({
            "source": "chatframe",
            "type": "hello",
            "height": 420
        }))
        .is_none());
    }

    #[test]
    fn malformed_shapes_are_ignored() {
        assert!(SizeMessage::parse(&json!("just a string")).is_none());
        assert!(SizeMessage::parse(&json!({"source": "chatframe"})).is_none());
        assert!(SizeMessage::parse(&json!({
            "source": "chatframe",
            "type": "size",
            "height": "tall"
        }))
        .is_none());
        assert!(SizeMessage::parse(&json!({
            "source": "chatframe",
            "type": "size",
            "height": -5
        }))
        .is_none());
    }

    #[test]
    fn wire_form_uses_the_type_key() {
        let json = serde_json::to_value(SizeMessage::new(300)).unwrap();
        assert_eq!(json["type"], "size");
        assert_eq!(json["source"], "chatframe");
        assert_eq!(json["height"], 300);
    }
}
