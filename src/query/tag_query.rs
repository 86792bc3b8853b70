//! Tag boolean expressions: `colour:blue,size:large` or `colour:blue OR colour:red`
//!
//! Pairs match literal tag identity. Alias groups are not consulted here.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::error::QueryError;
use crate::filter::Predicate;

const OR_SEPARATOR: &str = " or ";

/// How the pairs of a query combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryMode {
    /// Comma-separated: a file must carry every pair
    All,
    /// `OR`-separated: a file must carry at least one pair
    Any,
}

/// One `category:value` term
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPair {
    pub category: String,
    pub value: String,
}

impl fmt::Display for TagPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.value)
    }
}

/// A parsed tag query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagQuery {
    pub mode: QueryMode,
    pub pairs: Vec<TagPair>,
}

/// Split on ` OR ` in any letter case while keeping the original text of
/// each part. ASCII lowercasing keeps byte offsets aligned.
fn split_or(query: &str) -> Vec<&str> {
    let lowered = query.to_ascii_lowercase();
    let mut parts = Vec::new();
    let mut start = 0;
    for (at, _) in lowered.match_indices(OR_SEPARATOR) {
        if at < start {
            continue;
        }
        parts.push(&query[start..at]);
        start = at + OR_SEPARATOR.len();
    }
    parts.push(&query[start..]);
    parts
}

fn parse_pair(text: &str) -> Result<TagPair, QueryError> {
    let (category, value) = text
        .split_once(':')
        .ok_or_else(|| QueryError::InvalidTagPair(text.to_string()))?;
    let (category, value) = (category.trim(), value.trim());
    if category.is_empty() || value.is_empty() {
        return Err(QueryError::InvalidTagPair(text.to_string()));
    }
    Ok(TagPair {
        category: category.to_string(),
        value: value.to_string(),
    })
}

impl TagQuery {
    /// Parse a tag query.
    ///
    /// A query containing ` OR ` (any case) is an OR query; otherwise commas
    /// separate AND terms. The two forms cannot be mixed: in an OR query a
    /// comma is part of the value.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::EmptyQuery` for a blank query,
    /// `QueryError::InvalidTagPair` for a term without `:` or with an empty
    /// side, and `QueryError::NoTags` if no term remains.
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let (mode, terms) = if query.to_ascii_lowercase().contains(OR_SEPARATOR) {
            (QueryMode::Any, split_or(query))
        } else {
            (QueryMode::All, query.split(',').collect())
        };

        let pairs = terms
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(parse_pair)
            .collect::<Result<Vec<_>, _>>()?;

        if pairs.is_empty() {
            return Err(QueryError::NoTags);
        }
        Ok(Self { mode, pairs })
    }

    /// Predicate matching the literal pairs of this query
    #[must_use]
    pub fn predicate(&self) -> Predicate {
        let terms = self
            .pairs
            .iter()
            .map(|p| Predicate::has_tag(&p.category, &p.value))
            .collect();
        match self.mode {
            QueryMode::All => Predicate::And(terms),
            QueryMode::Any => Predicate::Or(terms),
        }
    }
}

impl FromStr for TagQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TagQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = match self.mode {
            QueryMode::All => ",",
            QueryMode::Any => " OR ",
        };
        let terms: Vec<String> = self.pairs.iter().map(ToString::to_string).collect();
        write!(f, "{}", terms.join(separator))
    }
}
