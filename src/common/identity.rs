use crate::config::{IdentityMatching, IdentitySettings};
use std::fmt;

/// A subject identity as returned by the identification endpoint, reduced to
/// its canonical token.
///
/// Raw ids look like `"<name>[-<qualifier>]"`; only the leading token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    token: String,
    display_name: String,
    key: String,
}

impl Identity {
    /// Parses a raw id with the default settings (`-` delimiter, case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        Self::parse_with(raw, &IdentitySettings::default())
    }

    /// Returns `None` when no canonical token remains after trimming.
    pub fn parse_with(raw: &str, settings: &IdentitySettings) -> Option<Self> {
        let token = raw
            .trim()
            .split(settings.delimiter)
            .next()
            .map(str::trim)
            .filter(|token| !token.is_empty())?;

        let key = match settings.matching {
            IdentityMatching::CaseInsensitive => token.to_lowercase(),
            IdentityMatching::CaseSensitive => token.to_string(),
        };

        Some(Self {
            token: token.to_string(),
            display_name: capitalize(token),
            key,
        })
    }

    /// Canonical token as received (before capitalization).
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Value compared by the deduplicator.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
