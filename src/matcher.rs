use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::config::RegexConfig;

/// Share links from tiktok.com, including the short `vm.`/`vt.` hosts.
/// Handles may contain dots (`@some.user`).
pub const DEFAULT_TIKTOK_PATTERN: &str =
    r"(?:https?://)?\b(?:(?:www|m|vm|vt)\.)?tiktok\.com/[\w@./?=&%-]+";

/// Reel links from instagram.com.
pub const DEFAULT_INSTAGRAM_PATTERN: &str =
    r"(?:https?://)?\b(?:www\.)?instagram\.com/reels?/[\w-]+/?";

static DEFAULT_TIKTOK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_TIKTOK_PATTERN).expect("built-in TikTok pattern"));

static DEFAULT_INSTAGRAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_INSTAGRAM_PATTERN).expect("built-in Instagram pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    TikTok,
    Instagram,
}

impl Platform {
    fn builtin(self) -> &'static Regex {
        match self {
            Platform::TikTok => &DEFAULT_TIKTOK,
            Platform::Instagram => &DEFAULT_INSTAGRAM,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::TikTok => write!(f, "tiktok"),
            Platform::Instagram => write!(f, "instagram"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMatch {
    NoMatch,
    Matched { platform: Platform, url: String },
}

/// Ordered link rules. The first rule that matches anywhere in the text
/// decides the result, regardless of where other links sit in the text.
#[derive(Debug, Clone)]
pub struct LinkMatcher {
    rules: Vec<(Platform, Regex)>,
}

impl LinkMatcher {
    /// Compile the configured patterns, TikTok first. A pattern that does
    /// not compile is replaced by the platform's built-in one.
    pub fn from_config(patterns: &RegexConfig) -> Self {
        let rules = [
            (Platform::TikTok, patterns.tiktok_regex.as_str()),
            (Platform::Instagram, patterns.instagram_regex.as_str()),
        ]
        .into_iter()
        .map(|(platform, pattern)| (platform, compile_or_builtin(platform, pattern)))
        .collect();

        Self { rules }
    }

    pub fn find(&self, text: &str) -> LinkMatch {
        for (platform, regex) in &self.rules {
            if let Some(m) = regex.find(text) {
                return LinkMatch::Matched {
                    platform: *platform,
                    url: with_scheme(trim_punctuation(m.as_str())),
                };
            }
        }
        LinkMatch::NoMatch
    }
}

fn compile_or_builtin(platform: Platform, pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            warn!(
                "Invalid {} pattern {:?}, using built-in pattern: {}",
                platform, pattern, e
            );
            platform.builtin().clone()
        }
    }
}

/// Sentence punctuation right after a link is not part of it.
fn trim_punctuation(url: &str) -> &str {
    url.trim_end_matches(['.', ',', '!', '?'])
}

/// Links pasted without a scheme still have to be fetchable.
fn with_scheme(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> LinkMatcher {
        LinkMatcher::from_config(&RegexConfig::default())
    }

    fn matched(platform: Platform, url: &str) -> LinkMatch {
        LinkMatch::Matched {
            platform,
            url: url.to_string(),
        }
    }

    #[test]
    fn test_plain_text_does_not_match() {
        let m = matcher();
        assert_eq!(m.find("hello"), LinkMatch::NoMatch);
        assert_eq!(m.find(""), LinkMatch::NoMatch);
        assert_eq!(m.find("see https://example.com/video/1"), LinkMatch::NoMatch);
        assert_eq!(m.find("https://www.instagram.com/p/abc"), LinkMatch::NoMatch);
    }

    #[test]
    fn test_tiktok_video_link() {
        assert_eq!(
            matcher().find("check this out https://www.tiktok.com/@user/video/12345"),
            matched(Platform::TikTok, "https://www.tiktok.com/@user/video/12345")
        );
    }

    #[test]
    fn test_tiktok_handle_with_dots() {
        assert_eq!(
            matcher().find("https://www.tiktok.com/@some.user/video/7312345678901234567"),
            matched(
                Platform::TikTok,
                "https://www.tiktok.com/@some.user/video/7312345678901234567"
            )
        );
    }

    #[test]
    fn test_trailing_punctuation_is_dropped() {
        let m = matcher();
        assert_eq!(
            m.find("look at this: https://www.tiktok.com/@some.user/video/1."),
            matched(Platform::TikTok, "https://www.tiktok.com/@some.user/video/1")
        );
        assert_eq!(
            m.find("https://vm.tiktok.com/ZMabc123/?!"),
            matched(Platform::TikTok, "https://vm.tiktok.com/ZMabc123/")
        );
        assert_eq!(
            m.find("new reel https://instagram.com/reel/abc."),
            matched(Platform::Instagram, "https://instagram.com/reel/abc")
        );
    }

    #[test]
    fn test_tiktok_short_link() {
        assert_eq!(
            matcher().find("lol https://vm.tiktok.com/ZMabc123/ so good"),
            matched(Platform::TikTok, "https://vm.tiktok.com/ZMabc123/")
        );
    }

    #[test]
    fn test_instagram_reel_link() {
        assert_eq!(
            matcher().find("watch https://www.instagram.com/reel/C1a2B3c-_x/ now"),
            matched(Platform::Instagram, "https://www.instagram.com/reel/C1a2B3c-_x/")
        );
    }

    #[test]
    fn test_tiktok_wins_over_earlier_instagram_link() {
        let text = "https://instagram.com/reel/abc then https://www.tiktok.com/@u/video/9";
        assert_eq!(
            matcher().find(text),
            matched(Platform::TikTok, "https://www.tiktok.com/@u/video/9")
        );
    }

    #[test]
    fn test_link_without_scheme_gets_https() {
        assert_eq!(
            matcher().find("tiktok.com/@user/video/1"),
            matched(Platform::TikTok, "https://tiktok.com/@user/video/1")
        );
    }

    #[test]
    fn test_lookalike_host_is_ignored() {
        assert_eq!(
            matcher().find("https://nottiktok.com/@user/video/1"),
            LinkMatch::NoMatch
        );
    }

    #[test]
    fn test_custom_pattern_is_used() {
        let patterns = RegexConfig {
            tiktok_regex: r"https://t\.example/\d+".to_string(),
            ..RegexConfig::default()
        };
        let m = LinkMatcher::from_config(&patterns);

        assert_eq!(
            m.find("go https://t.example/42"),
            matched(Platform::TikTok, "https://t.example/42")
        );
        assert_eq!(m.find("https://www.tiktok.com/@u/video/1"), LinkMatch::NoMatch);
    }

    #[test]
    fn test_invalid_pattern_falls_back_to_builtin() {
        let patterns = RegexConfig {
            instagram_regex: "(unclosed".to_string(),
            ..RegexConfig::default()
        };
        let m = LinkMatcher::from_config(&patterns);

        assert_eq!(
            m.find("https://instagram.com/reels/xyz"),
            matched(Platform::Instagram, "https://instagram.com/reels/xyz")
        );
    }
}
