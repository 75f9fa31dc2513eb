//! Prompt pattern synthesis and matching.

use regex::bytes::Regex;

use crate::error::{ChannelError, Result};

/// Characters that make up a prompt's anchor token.
const IDENT: &str = r"[\w\-]";

/// Decoration group, e.g. `(config-if)`.
const DECORATION: &str = r"(?:\([^)\r\n]*\))?";

/// Trait for prompt matching over a single line.
pub trait PromptMatcher: Send + Sync {
    /// Check if the line matches.
    fn is_match(&self, line: &[u8]) -> bool;
}

impl PromptMatcher for Regex {
    fn is_match(&self, line: &[u8]) -> bool {
        Regex::is_match(self, line)
    }
}

/// A prompt pattern bound to one device's anchor token.
///
/// Matches the device's prompt in any mode (`router1>`, `router1#`,
/// `router1(config-if)#`) and nothing carrying another hostname.
#[derive(Debug, Clone)]
pub struct PromptPattern {
    anchor: String,
    regex: Regex,
}

impl PromptPattern {
    /// The anchor token, usually the hostname.
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Get a reference to the underlying regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The regex source.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PromptMatcher for PromptPattern {
    fn is_match(&self, line: &[u8]) -> bool {
        self.regex.is_match(line)
    }
}

/// Builds [`PromptPattern`]s from observed prompt lines.
#[derive(Debug, Clone)]
pub struct PromptPatternBuilder {
    delimiters: Vec<char>,
    class: String,
    extract: Regex,
    probe: Regex,
}

impl PromptPatternBuilder {
    /// Create a builder for the given prompt delimiter characters (e.g. `>` and `#`).
    pub fn new(delimiters: &[char]) -> Result<Self> {
        if delimiters.is_empty() {
            return Err(ChannelError::PromptFormat {
                line: String::new(),
            }
            .into());
        }

        let class = delimiter_class(delimiters);
        let extract = Regex::new(&format!(r"({IDENT}+){DECORATION}\s?{class}"))
            .map_err(ChannelError::from)?;
        let probe = Regex::new(&format!(r"{IDENT}{DECORATION}\s?{class}\s*$"))
            .map_err(ChannelError::from)?;

        Ok(Self {
            delimiters: delimiters.to_vec(),
            class,
            extract,
            probe,
        })
    }

    /// The delimiter characters this builder was created with.
    pub fn delimiters(&self) -> &[char] {
        &self.delimiters
    }

    /// Generic prompt-shaped line matcher, for use before a pattern exists.
    pub fn probe(&self) -> &Regex {
        &self.probe
    }

    /// Build a pattern from raw output whose last non-empty line is a prompt.
    pub fn build(&self, raw: &str) -> Result<PromptPattern> {
        let line = raw
            .lines()
            .map(|l| l.trim_matches(|c: char| c.is_whitespace()))
            .filter(|l| !l.is_empty())
            .last()
            .unwrap_or_default();

        let anchor = self
            .extract
            .captures_iter(line.as_bytes())
            .last()
            .and_then(|caps| caps.get(1))
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
            .ok_or_else(|| ChannelError::PromptFormat {
                line: line.to_string(),
            })?;

        let pattern = format!(
            r"(?:^|[^\w\-]){}{DECORATION}\s?{}\s*$",
            regex::escape(&anchor),
            self.class
        );
        let regex = Regex::new(&pattern).map_err(ChannelError::from)?;

        Ok(PromptPattern { anchor, regex })
    }
}

fn delimiter_class(delimiters: &[char]) -> String {
    let body: String = delimiters
        .iter()
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    format!("[{body}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PromptPatternBuilder {
        PromptPatternBuilder::new(&['>', '#']).unwrap()
    }

    #[test]
    fn test_pattern_matches_every_mode_of_same_host() {
        let pattern = builder().build("router1>").unwrap();
        assert_eq!(pattern.anchor(), "router1");

        assert!(pattern.is_match(b"router1>"));
        assert!(pattern.is_match(b"router1#"));
        assert!(pattern.is_match(b"router1(config)#"));
        assert!(pattern.is_match(b"router1(config-if)# "));
        assert!(!pattern.is_match(b"router2>"));
        assert!(!pattern.is_match(b"router10>"));
    }

    #[test]
    fn test_build_uses_last_line() {
        let raw = "\r\nWelcome to the lab\r\n\r\ncore-sw_01#  \r\n";
        let pattern = builder().build(raw).unwrap();
        assert_eq!(pattern.anchor(), "core-sw_01");
        assert!(pattern.is_match(b"core-sw_01(config)#"));
    }

    #[test]
    fn test_build_from_decorated_prompt() {
        let pattern = builder().build("router1(config)#").unwrap();
        assert_eq!(pattern.anchor(), "router1");
        assert!(pattern.is_match(b"router1>"));

        let pattern = builder().build("\r\nrouter1(config-if)# ").unwrap();
        assert_eq!(pattern.anchor(), "router1");
        assert!(pattern.is_match(b"router1(config)#"));
        assert!(!pattern.is_match(b"router2(config-if)#"));
    }

    #[test]
    fn test_build_user_at_host() {
        let pattern = builder().build("admin@edge1>").unwrap();
        assert_eq!(pattern.anchor(), "edge1");
        assert!(pattern.is_match(b"admin@edge1#"));
        assert!(!pattern.is_match(b"admin@edge2#"));
    }

    #[test]
    fn test_build_rejects_promptless_line() {
        let err = builder().build("Password:").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Channel(ChannelError::PromptFormat { .. })
        ));

        assert!(builder().build("").is_err());
    }

    #[test]
    fn test_regex_metachar_delimiters() {
        let builder = PromptPatternBuilder::new(&['$', ']', '%']).unwrap();
        let pattern = builder.build("box%").unwrap();
        assert!(pattern.is_match(b"box$"));
        assert!(pattern.is_match(b"box]"));
        assert!(!pattern.is_match(b"box>"));
    }

    #[test]
    fn test_probe() {
        let b = builder();
        assert!(b.probe().is_match(b"anything>"));
        assert!(b.probe().is_match(b"sw(config)# "));
        assert!(!b.probe().is_match(b"Username:"));
    }

    #[test]
    fn test_empty_delimiters_rejected() {
        assert!(PromptPatternBuilder::new(&[]).is_err());
    }
}
