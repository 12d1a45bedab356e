//! Message row templating.
//!
//! Row layout is driven by a template string with `{{placeholder}}`
//! tokens. Substituted values always become text nodes, so feed data can
//! never smuggle markup into the tree; only the `{{message}}` slot splices
//! pre-built content nodes in place.

use chrono::DateTime;
use tracing::trace;

use crate::config::OverlayConfig;
use crate::dom::{Document, NodeId};
use crate::error::RenderError;
use crate::feed::message::Message;

#[derive(Debug, PartialEq)]
enum Token {
    Literal(String),
    Placeholder(String),
}

/// Split a template into literal runs and `{{name}}` tokens. An unclosed
/// `{{` is treated as literal text.
fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        if let Some(close) = rest[open..].find("}}") {
            if open > 0 {
                tokens.push(Token::Literal(rest[..open].to_string()));
            }
            let name = rest[open + 2..open + close].trim().to_string();
            tokens.push(Token::Placeholder(name));
            rest = &rest[open + close + 2..];
        } else {
            break;
        }
    }
    if !rest.is_empty() {
        tokens.push(Token::Literal(rest.to_string()));
    }
    tokens
}

/// Expands the active row template for one message.
pub struct TemplateEngine<'a> {
    config: &'a OverlayConfig,
}

impl<'a> TemplateEngine<'a> {
    pub fn new(config: &'a OverlayConfig) -> Self {
        Self { config }
    }

    /// Expand the template into children of `row`. `content` holds the
    /// already-rendered body nodes for the `{{message}}` slot; they are
    /// appended in order, exactly once.
    pub fn render_into(
        &self,
        doc: &mut Document,
        row: NodeId,
        message: &Message,
        content: Vec<NodeId>,
    ) -> Result<(), RenderError> {
        let mut content = Some(content);

        for token in tokenize(self.config.active_template()) {
            match token {
                Token::Literal(text) => self.append_text(doc, row, &text)?,
                Token::Placeholder(name) => match name.as_str() {
                    "author" => self.append_text(doc, row, &message.author)?,
                    "timestamp" => {
                        let formatted = self.formatted_timestamp(message);
                        self.append_text(doc, row, &formatted)?;
                    }
                    "timestamp_raw" => {
                        let raw = message.timestamp.as_deref().unwrap_or("");
                        self.append_text(doc, row, raw)?;
                    }
                    "message" => {
                        if let Some(nodes) = content.take() {
                            for node in nodes {
                                doc.append_child(row, node)?;
                            }
                        }
                    }
                    "role_color" => {
                        let color = message.role_color.as_deref().unwrap_or("");
                        self.append_text(doc, row, color)?;
                    }
                    "avatar_url" => {
                        let url = message.avatar_url.as_deref().unwrap_or("");
                        self.append_text(doc, row, url)?;
                    }
                    "newline" => {
                        let br = doc.create_element("br");
                        doc.append_child(row, br)?;
                    }
                    other => trace!(placeholder = other, "dropping unknown template placeholder"),
                },
            }
        }
        Ok(())
    }

    /// Literal text, with embedded `\n` expanded to line breaks.
    fn append_text(
        &self,
        doc: &mut Document,
        row: NodeId,
        text: &str,
    ) -> Result<(), RenderError> {
        if text.is_empty() {
            return Ok(());
        }
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                let br = doc.create_element("br");
                doc.append_child(row, br)?;
            }
            if !line.is_empty() {
                let node = doc.create_text(line);
                doc.append_child(row, node)?;
            }
        }
        Ok(())
    }

    /// Timestamp formatted through the timestamp template, or empty when
    /// timestamps are hidden or absent. An unparseable timestamp passes
    /// through unformatted rather than disappearing.
    fn formatted_timestamp(&self, message: &Message) -> String {
        if !self.config.show_timestamps {
            return String::new();
        }
        let Some(raw) = message.timestamp.as_deref().filter(|s| !s.is_empty()) else {
            return String::new();
        };
        let time = DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_else(|_| raw.to_string());
        self.config.timestamp_template.replace("{{time}}", &time)
    }
}
