//! Runtime configuration resolved from URL query parameters.
//!
//! The overlay page derives everything from its own URL once at load:
//! embed mode, which feed to poll, the poll cadence, template overrides and
//! the visual knobs. Parameter aliases are normalized here so the rest of
//! the pipeline only ever sees canonical names. The resolved value is
//! immutable for the page session.

pub mod theme;

use std::collections::HashMap;

use crate::error::ConfigError;

/// Default poll cadence in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default clamp for embed auto-resize height reports.
pub const DEFAULT_MAX_HEIGHT: u32 = 600;

/// Default full message layout.
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "{{author}}:{{timestamp}} {{message}}";

/// Default layout when usernames are hidden.
pub const DEFAULT_HIDE_USERNAME_TEMPLATE: &str = "{{message}}";

/// Default wrapper around the formatted time.
pub const DEFAULT_TIMESTAMP_TEMPLATE: &str = " ({{time}})";

/// Which of the two parallel feeds a client requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedTarget {
    #[default]
    Obs,
    Embed,
}

impl FeedTarget {
    /// Path of the matching feed endpoint.
    pub fn endpoint(self) -> &'static str {
        match self {
            FeedTarget::Obs => "/chat",
            FeedTarget::Embed => "/embed-chat",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeedTarget::Obs => "obs",
            FeedTarget::Embed => "embed",
        }
    }
}

impl std::str::FromStr for FeedTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "obs" => Ok(FeedTarget::Obs),
            "embed" => Ok(FeedTarget::Embed),
            other => Err(ConfigError::InvalidValue {
                key: "target".to_string(),
                message: format!("expected 'obs' or 'embed', got '{other}'"),
            }),
        }
    }
}

/// Immutable per-page-load configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub embed: bool,
    pub target: FeedTarget,
    pub poll_interval_ms: u64,
    pub transparent: bool,
    pub hide_usernames: bool,
    pub auto_resize: bool,
    pub show_timestamps: bool,
    pub api_origin: Option<String>,
    pub frame_height: Option<u32>,
    pub max_height: u32,

    // Visual overrides, applied by the theme module.
    pub background: Option<String>,
    pub message_background: Option<String>,
    pub text_color: Option<String>,
    pub username_color: Option<String>,
    pub font: Option<String>,
    pub background_media: Option<String>,
    pub bubble_padding: Option<String>,
    pub line_height: Option<String>,
    pub avatar_size: Option<String>,
    pub emoji_size: Option<String>,
    pub white_space: Option<String>,
    pub message_max_width: Option<String>,
    pub message_min_width: Option<String>,
    /// 0-100 percent sliders, converted to alpha by the theme.
    pub message_background_transparency: Option<String>,
    pub background_media_transparency: Option<String>,

    // Template overrides.
    pub message_template: String,
    pub hide_username_template: String,
    pub timestamp_template: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            embed: false,
            target: FeedTarget::Obs,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            transparent: false,
            hide_usernames: false,
            auto_resize: false,
            show_timestamps: true,
            api_origin: None,
            frame_height: None,
            max_height: DEFAULT_MAX_HEIGHT,
            background: None,
            message_background: None,
            text_color: None,
            username_color: None,
            font: None,
            background_media: None,
            bubble_padding: None,
            line_height: None,
            avatar_size: None,
            emoji_size: None,
            white_space: None,
            message_max_width: None,
            message_min_width: None,
            message_background_transparency: None,
            background_media_transparency: None,
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
            hide_username_template: DEFAULT_HIDE_USERNAME_TEMPLATE.to_string(),
            timestamp_template: DEFAULT_TIMESTAMP_TEMPLATE.to_string(),
        }
    }
}

/// Truthy values accepted for boolean parameters.
const TRUE_VALUES: &[&str] = &["1", "true", "yes", "on", "y", "t"];
const FALSE_VALUES: &[&str] = &["0", "false", "no", "off", "n", "f"];

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    let lowered = value.trim().to_ascii_lowercase();
    if TRUE_VALUES.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSE_VALUES.contains(&lowered.as_str()) || lowered.is_empty() {
        Ok(false)
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{value}' is not a boolean"),
        })
    }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{value}' is not a non-negative integer"),
        })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{value}' is not a non-negative integer"),
        })
}

/// First value found among a canonical key and its aliases, in order.
fn lookup<'a>(params: &'a HashMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| params.get(*k))
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

impl OverlayConfig {
    /// Resolve configuration from a raw query string (no leading `?`).
    pub fn from_query(query: &str) -> Result<Self, ConfigError> {
        let params: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self::from_params(&params)
    }

    /// Resolve configuration from an already-parsed parameter map (used by
    /// the declarative auto-mount path, which reads script attributes).
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup(params, &["embed"]) {
            config.embed = parse_bool("embed", v)?;
        }
        if let Some(v) = lookup(params, &["chat_target", "target"]) {
            config.target = v.parse()?;
        }
        if let Some(v) = lookup(params, &["poll_interval", "interval"]) {
            config.poll_interval_ms = parse_u64("poll_interval", v)?;
        }
        if let Some(v) = lookup(params, &["transparent"]) {
            config.transparent = parse_bool("transparent", v)?;
        }
        if let Some(v) = lookup(params, &["hide_usernames"]) {
            config.hide_usernames = parse_bool("hide_usernames", v)?;
        }
        if let Some(v) = lookup(params, &["auto_resize"]) {
            config.auto_resize = parse_bool("auto_resize", v)?;
        }
        if let Some(v) = lookup(params, &["show_timestamps", "timestamps"]) {
            config.show_timestamps = parse_bool("show_timestamps", v)?;
        }
        if let Some(v) = lookup(params, &["api_origin", "chat_origin", "origin"]) {
            config.api_origin = Some(v.to_string());
        }
        if let Some(v) = lookup(params, &["frame_height", "embed_height", "height"]) {
            config.frame_height = Some(parse_u32("frame_height", v)?);
        }
        if let Some(v) = lookup(params, &["max_height", "maxHeight"]) {
            config.max_height = parse_u32("max_height", v)?;
        }

        config.background = lookup(params, &["background", "bg"]).map(str::to_string);
        config.message_background =
            lookup(params, &["message_background", "message_bg"]).map(str::to_string);
        config.text_color = lookup(params, &["text_color", "message_color"]).map(str::to_string);
        config.username_color =
            lookup(params, &["username_color", "name_color"]).map(str::to_string);
        config.font = lookup(params, &["font"]).map(str::to_string);
        config.background_media =
            lookup(params, &["background_media", "backgroundMedia"]).map(str::to_string);
        config.bubble_padding = lookup(params, &["padding", "bubble_padding"]).map(str::to_string);
        config.line_height = lookup(params, &["line_height"]).map(str::to_string);
        config.avatar_size = lookup(params, &["avatar_size"]).map(str::to_string);
        config.emoji_size = lookup(params, &["emoji_size"]).map(str::to_string);
        config.white_space = lookup(params, &["text_wrap", "white_space"]).map(str::to_string);
        config.message_max_width =
            lookup(params, &["message_max_width", "max_width"]).map(str::to_string);
        config.message_min_width =
            lookup(params, &["message_min_width", "min_width"]).map(str::to_string);
        config.message_background_transparency =
            lookup(params, &["message_background_transparency", "message_opacity"])
                .map(str::to_string);
        config.background_media_transparency =
            lookup(params, &["background_media_transparency", "background_opacity"])
                .map(str::to_string);

        if let Some(v) = lookup(params, &["message_template", "template"]) {
            config.message_template = v.to_string();
        }
        if let Some(v) = lookup(params, &["hide_username_template"]) {
            config.hide_username_template = v.to_string();
        }
        if let Some(v) = lookup(params, &["timestamp_template"]) {
            config.timestamp_template = v.to_string();
        }

        Ok(config)
    }

    /// Resolve configuration from a full page URL.
    pub fn from_url(url: &url::Url) -> Result<Self, ConfigError> {
        Self::from_query(url.query().unwrap_or(""))
    }

    /// The layout template selected by the hide-usernames toggle.
    pub fn active_template(&self) -> &str {
        if self.hide_usernames {
            &self.hide_username_template
        } else {
            &self.message_template
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_overlay_expectations() {
        let config = OverlayConfig::default();
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.target, FeedTarget::Obs);
        assert_eq!(config.max_height, 600);
        assert!(config.show_timestamps);
        assert!(!config.embed);
    }

    #[test]
    fn parses_canonical_query() {
        let config = OverlayConfig::from_query(
            "embed=1&target=embed&transparent=true&hide_usernames=yes&auto_resize=on",
        )
        .unwrap();
        assert!(config.embed);
        assert_eq!(config.target, FeedTarget::Embed);
        assert!(config.transparent);
        assert!(config.hide_usernames);
        assert!(config.auto_resize);
    }

    #[test]
    fn aliases_normalize_to_one_concept() {
        let a = OverlayConfig::from_query("bg=%23000&message_bg=%23111&name_color=red").unwrap();
        let b = OverlayConfig::from_query(
            "background=%23000&message_background=%23111&username_color=red",
        )
        .unwrap();
        assert_eq!(a.background, b.background);
        assert_eq!(a.message_background, b.message_background);
        assert_eq!(a.username_color, b.username_color);
    }

    #[test]
    fn canonical_key_wins_over_alias() {
        let config = OverlayConfig::from_query("background=canonical&bg=alias").unwrap();
        assert_eq!(config.background.as_deref(), Some("canonical"));
    }

    #[test]
    fn origin_aliases_resolve() {
        for query in [
            "api_origin=http://a:1",
            "chat_origin=http://a:1",
            "origin=http://a:1",
        ] {
            let config = OverlayConfig::from_query(query).unwrap();
            assert_eq!(config.api_origin.as_deref(), Some("http://a:1"));
        }
    }

    #[test]
    fn height_aliases_and_bounds() {
        let config =
            OverlayConfig::from_query("embed_height=420&maxHeight=900").unwrap();
        assert_eq!(config.frame_height, Some(420));
        assert_eq!(config.max_height, 900);
    }

    #[test]
    fn rejects_non_boolean_flag() {
        let err = OverlayConfig::from_query("embed=maybe").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_bad_interval() {
        let err = OverlayConfig::from_query("poll_interval=fast").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_unknown_target() {
        let err = OverlayConfig::from_query("target=twitch").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn hide_usernames_selects_message_only_template() {
        let config = OverlayConfig::from_query("hide_usernames=1").unwrap();
        assert_eq!(config.active_template(), DEFAULT_HIDE_USERNAME_TEMPLATE);
        let config = OverlayConfig::default();
        assert_eq!(config.active_template(), DEFAULT_MESSAGE_TEMPLATE);
    }

    #[test]
    fn from_url_reads_query() {
        let url = url::Url::parse("http://localhost:8080/?embed=1&target=embed").unwrap();
        let config = OverlayConfig::from_url(&url).unwrap();
        assert!(config.embed);
        assert_eq!(config.target, FeedTarget::Embed);
    }

    #[test]
    fn empty_values_are_ignored() {
        let config = OverlayConfig::from_query("background=&font=mono").unwrap();
        assert!(config.background.is_none());
        assert_eq!(config.font.as_deref(), Some("mono"));
    }
}
