//! Maps resolved configuration onto the overlay's presentation variables.
//!
//! Variable names match the stylesheet's custom properties; only overrides
//! the page supplied are emitted, so the stylesheet defaults stay in force
//! for everything else.

use std::collections::BTreeMap;

use crate::config::OverlayConfig;
use crate::dom::{Document, NodeId};
use crate::error::RenderError;

/// Ordered set of presentation variables derived from the configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeVars {
    vars: BTreeMap<String, String>,
}

impl ThemeVars {
    /// Derive the variable set from a resolved configuration.
    pub fn from_config(config: &OverlayConfig) -> Self {
        let mut vars = BTreeMap::new();
        let mut set = |name: &str, value: &Option<String>| {
            if let Some(v) = value {
                vars.insert(name.to_string(), v.clone());
            }
        };

        set("--chat-background", &config.background);
        set("--message-background", &config.message_background);
        set("--message-color", &config.text_color);
        set("--username-color-default", &config.username_color);
        set("--chat-font-family", &config.font);
        set("--background-media-url", &config.background_media);
        set("--bubble-padding", &config.bubble_padding);
        set("--message-line-height", &config.line_height);
        set("--avatar-size", &config.avatar_size);
        set("--emoji-size", &config.emoji_size);
        set("--message-white-space", &config.white_space);
        set("--message-max-width", &config.message_max_width);
        set("--message-min-width", &config.message_min_width);

        if let Some(percent) = &config.message_background_transparency {
            vars.insert(
                "--message-background-opacity".to_string(),
                percent_to_alpha(percent),
            );
        }
        if let Some(percent) = &config.background_media_transparency {
            vars.insert(
                "--background-media-opacity".to_string(),
                percent_to_alpha(percent),
            );
        }
        if config.transparent {
            vars.insert("--chat-background".to_string(), "transparent".to_string());
        }

        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Serialize as an inline style declaration list.
    pub fn to_style(&self) -> String {
        self.vars
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Write the variables onto a root element's `style` attribute.
    pub fn apply(&self, doc: &mut Document, root: NodeId) -> Result<(), RenderError> {
        if !self.vars.is_empty() {
            doc.set_attr(root, "style", &self.to_style())?;
        }
        Ok(())
    }
}

/// Convert a 0-100 transparency percent (0 = opaque) into a CSS alpha.
///
/// Mirrors the configurator's slider semantics: non-numeric characters are
/// stripped, the value clamps to [0, 100], and trailing zeros are trimmed.
pub fn percent_to_alpha(text: &str) -> String {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let percent = digits.parse::<f64>().unwrap_or(0.0).clamp(0.0, 100.0);
    let alpha = 1.0 - percent / 100.0;
    let formatted = format!("{alpha:.3}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
