//! Embed URL construction.

use url::Url;

use crate::embed::EmbedOptions;
use crate::error::EmbedError;

/// Build the canonical iframe source URL for a chat frame hosted at
/// `origin`. Copy-pasted origins often point at a page rather than the
/// site root, so well-known page suffixes are stripped first; the option
/// set is then encoded in a fixed key order, one canonical key per
/// concept (aliases accepted elsewhere never appear here).
pub fn build_url(origin: &str, options: &EmbedOptions) -> Result<String, EmbedError> {
    let origin = origin.trim();
    if origin.is_empty() {
        return Err(EmbedError::MissingOrigin);
    }
    let mut url = Url::parse(origin).map_err(|e| EmbedError::InvalidOrigin {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;

    url.set_path(&site_root(url.path()));
    url.set_query(None);
    url.set_fragment(None);

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("embed", "1");
        query.append_pair("target", options.target.as_str());
        if options.transparent {
            query.append_pair("transparent", "1");
        }
        if options.hide_usernames {
            query.append_pair("hide_usernames", "1");
        }
        if options.auto_resize {
            query.append_pair("auto_resize", "1");
        }
        for (key, value) in [
            ("background", &options.background),
            ("message_background", &options.message_background),
            ("text_color", &options.text_color),
            ("username_color", &options.username_color),
            ("font", &options.font),
            ("background_media", &options.background_media),
        ] {
            if let Some(value) = value {
                query.append_pair(key, value);
            }
        }
        if let Some(height) = options.frame_height {
            query.append_pair("frame_height", &height.to_string());
        }
        if let Some(max) = options.max_height {
            query.append_pair("max_height", &max.to_string());
        }
    }

    Ok(url.to_string())
}

/// Strip trailing page suffixes until only the site root remains.
fn site_root(path: &str) -> String {
    let mut path = path.trim_end_matches('/').to_string();
    loop {
        if let Some(rest) = path.strip_suffix("/index.html") {
            path = rest.trim_end_matches('/').to_string();
        } else if let Some(rest) = path.strip_suffix("/chat") {
            path = rest.trim_end_matches('/').to_string();
        } else {
            break;
        }
    }
    if path.is_empty() { "/".to_string() } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedTarget;

    #[test]
    fn bare_origin_gets_canonical_query() {
        let url = build_url("http://localhost:8080", &EmbedOptions::default()).unwrap();
        assert_eq!(url, "http://localhost:8080/?embed=1&target=embed");
    }

    #[test]
    fn page_suffixes_are_stripped_to_the_site_root() {
        for origin in [
            "http://host/chat",
            "http://host/chat/",
            "http://host/index.html",
            "http://host/chat/index.html",
        ] {
            let url = build_url(origin, &EmbedOptions::default()).unwrap();
            assert!(
                url.starts_with("http://host/?"),
                "{origin} resolved to {url}"
            );
        }
    }

    #[test]
    fn nested_deployments_keep_their_base_path() {
        let url = build_url("http://host/overlay/chat/", &EmbedOptions::default()).unwrap();
        assert!(url.starts_with("http://host/overlay?"), "{url}");
    }

    #[test]
    fn options_encode_in_fixed_order() {
        let options = EmbedOptions::default()
            .with_target(FeedTarget::Obs)
            .with_transparent(true)
            .with_auto_resize(true)
            .with_background("#112233")
            .with_max_height(500);
        let url = build_url("http://host", &options).unwrap();
        assert_eq!(
            url,
            "http://host/?embed=1&target=obs&transparent=1&auto_resize=1&background=%23112233&max_height=500"
        );
    }

    #[test]
    fn empty_origin_is_rejected() {
        assert!(matches!(
            build_url("   ", &EmbedOptions::default()),
            Err(EmbedError::MissingOrigin)
        ));
    }

    #[test]
    fn unparsable_origin_is_rejected() {
        assert!(matches!(
            build_url("not a url", &EmbedOptions::default()),
            Err(EmbedError::InvalidOrigin { .. })
        ));
    }

    #[test]
    fn existing_query_and_fragment_are_discarded() {
        let url = build_url("http://host/chat?old=1#frag", &EmbedOptions::default()).unwrap();
        assert_eq!(url, "http://host/?embed=1&target=embed");
    }
}
