use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::IltError;

/// NIST setid (opaque hash) identifying one data set, e.g. `zpbKw`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetId(String);

impl SetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SetId {
    type Err = IltError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let is_valid =
            !normalized.is_empty() && normalized.chars().all(|ch| ch.is_ascii_alphanumeric());
        if !is_valid {
            return Err(IltError::InvalidSetId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

fn year_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\((\d{4})").unwrap())
}

/// Free-text citation as shown in the ILThermo result table, like
/// `Krolikowska et al. (2012)`, `Klomfar and Mann (2015)` or `Neves (2013a)`.
///
/// The derived key is unique per publication within the database, so it can
/// serve as a stable identifier over repeated lookups (e.g. a BibTeX key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation(String);

impl Citation {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First author's last name.
    pub fn first_author(&self) -> Result<&str, IltError> {
        self.0
            .split_whitespace()
            .next()
            .ok_or_else(|| IltError::MalformedCitation(self.0.clone()))
    }

    /// Publication year, parsed from the trailing `(YYYY)` / `(YYYYa)` token.
    pub fn year(&self) -> Result<i32, IltError> {
        let last = self
            .0
            .split_whitespace()
            .next_back()
            .ok_or_else(|| IltError::MalformedCitation(self.0.clone()))?;
        let captures = year_token_regex()
            .captures(last)
            .ok_or_else(|| IltError::MalformedCitation(self.0.clone()))?;
        captures[1]
            .parse()
            .map_err(|_| IltError::MalformedCitation(self.0.clone()))
    }

    /// Short citation key, like `KrolikowskaEtal2012`, `KlomfarMann2015` or
    /// `Neves2013a`.
    ///
    /// Three citation shapes are recognized: "et al.", an explicit standalone
    /// "and" between two authors, and single-author. The year part keeps any
    /// disambiguation suffix, so `(2013a)` contributes `2013a`.
    pub fn key(&self) -> Result<String, IltError> {
        let tokens: Vec<&str> = self.0.split_whitespace().collect();
        let (first, last) = match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) if tokens.len() >= 2 => (*first, *last),
            _ => return Err(IltError::MalformedCitation(self.0.clone())),
        };
        let year_token = last
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| IltError::MalformedCitation(self.0.clone()))?;

        if self.0.contains("et al.") {
            return Ok(format!("{first}Etal{year_token}"));
        }
        if tokens.iter().any(|token| *token == "and") {
            let second = tokens
                .get(2)
                .ok_or_else(|| IltError::MalformedCitation(self.0.clone()))?;
            return Ok(format!("{first}{second}{year_token}"));
        }
        Ok(format!("{first}{year_token}"))
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
