//! File id range expressions: `1-5,8,10-12`

use std::collections::BTreeSet;

use super::error::QueryError;
use crate::db::FileId;

/// Upper bound on the number of ids a single `start-end` token may expand to
pub const MAX_RANGE_SPAN: FileId = 100_000;

fn parse_id(text: &str) -> Option<FileId> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn invalid(token: &str, reason: &str) -> QueryError {
    QueryError::InvalidRange(token.to_string(), reason.to_string())
}

/// Parse a comma-separated list of ids and inclusive `start-end` ranges.
///
/// Whitespace around tokens is ignored and empty tokens are skipped. The
/// result is sorted ascending without duplicates.
///
/// # Errors
///
/// Returns `QueryError::InvalidRange` naming the first malformed token, or
/// `QueryError::NoFileIds` if the expression holds no ids. No partial
/// result is ever returned.
pub fn parse_range(expr: &str) -> Result<Vec<FileId>, QueryError> {
    let mut ids = BTreeSet::new();

    for token in expr.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some((start, end)) = token.split_once('-') {
            if end.contains('-') {
                return Err(invalid(token, "expected 'start-end'"));
            }
            let start = parse_id(start).ok_or_else(|| invalid(token, "invalid start ID"))?;
            let end = parse_id(end).ok_or_else(|| invalid(token, "invalid end ID"))?;
            if start > end {
                return Err(invalid(token, "start must be <= end"));
            }
            if end - start >= MAX_RANGE_SPAN {
                return Err(invalid(
                    token,
                    &format!("spans more than {MAX_RANGE_SPAN} IDs"),
                ));
            }
            ids.extend(start..=end);
        } else {
            ids.insert(parse_id(token).ok_or_else(|| invalid(token, "invalid file ID"))?);
        }
    }

    if ids.is_empty() {
        return Err(QueryError::NoFileIds);
    }
    Ok(ids.into_iter().collect())
}
