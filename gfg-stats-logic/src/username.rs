use std::{fmt, sync::LazyLock};

use regex::Regex;
use thiserror::Error;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 50;

static STRICT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid strict username pattern"));

static DOTTED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("Invalid dotted username pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which character set a route accepts for usernames
pub enum UsernameRule {
    /// Alphanumeric plus `_` and `-`
    Strict,
    /// Alphanumeric plus `_`, `-` and `.`
    Dotted,
}

impl UsernameRule {
    fn pattern(self) -> &'static Regex {
        match self {
            Self::Strict => LazyLock::force(&STRICT_PATTERN),
            Self::Dotted => LazyLock::force(&DOTTED_PATTERN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("{}", too_short_message(.0))]
    TooShort(UsernameRule),
    #[error("{}", too_long_message(.0))]
    TooLong(UsernameRule),
    #[error("{}", invalid_format_message(.0))]
    InvalidFormat(UsernameRule),
}

fn too_short_message(rule: &UsernameRule) -> &'static str {
    match rule {
        UsernameRule::Dotted => "Username too short",
        UsernameRule::Strict => "String must contain at least 3 character(s)",
    }
}

fn too_long_message(rule: &UsernameRule) -> &'static str {
    match rule {
        UsernameRule::Dotted => "Username too long",
        UsernameRule::Strict => "String must contain at most 50 character(s)",
    }
}

fn invalid_format_message(rule: &UsernameRule) -> &'static str {
    match rule {
        UsernameRule::Dotted => "Invalid username format",
        UsernameRule::Strict => "Invalid",
    }
}

/// A username that passed one of the [UsernameRule] checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str, rule: UsernameRule) -> Result<Self, UsernameError> {
        // UTF-16 code units, as a browser measures string length
        let len = raw.encode_utf16().count();

        if len < MIN_LEN {
            Err(UsernameError::TooShort(rule))
        } else if len > MAX_LEN {
            Err(UsernameError::TooLong(rule))
        } else if !rule.pattern().is_match(raw) {
            Err(UsernameError::InvalidFormat(rule))
        } else {
            Ok(Self(raw.to_string()))
        }
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
