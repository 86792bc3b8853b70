//! Boolean predicates over a file's tag associations
//!
//! A `Predicate` is a small expression tree describing which files a listing
//! or a bulk selection should contain. It is built by the alias resolver and
//! the tag-query parser, and compiled to SQL in exactly one place
//! ([`super::compile`]). [`Predicate::matches`] evaluates the same tree
//! against an in-memory tag map.

use crate::db::TagMap;

/// Expression tree over the tags attached to a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every file
    Always,
    /// Every child must match (an empty list matches everything)
    And(Vec<Predicate>),
    /// At least one child must match (an empty list matches nothing)
    Or(Vec<Predicate>),
    /// Inverts the child
    Not(Box<Predicate>),
    /// The file has a tag in `category` whose value is one of `values`
    HasTag { category: String, values: Vec<String> },
    /// The file has at least one tag in `category`
    InCategory { category: String },
    /// The file has at least one tag of any category
    Tagged,
}

impl Predicate {
    /// File carries exactly this `(category, value)` tag
    #[must_use]
    pub fn has_tag(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self::HasTag {
            category: category.into(),
            values: vec![value.into()],
        }
    }

    /// File carries a tag in `category` with any of `values`
    #[must_use]
    pub fn has_any_tag(category: impl Into<String>, values: Vec<String>) -> Self {
        Self::HasTag {
            category: category.into(),
            values,
        }
    }

    /// File has no tag at all in `category`
    #[must_use]
    pub fn unassigned(category: impl Into<String>) -> Self {
        Self::Not(Box::new(Self::InCategory {
            category: category.into(),
        }))
    }

    /// File has no tags at all
    #[must_use]
    pub fn untagged() -> Self {
        Self::Not(Box::new(Self::Tagged))
    }

    /// Evaluate against the tags of one file
    #[must_use]
    pub fn matches(&self, tags: &TagMap) -> bool {
        match self {
            Self::Always => true,
            Self::And(parts) => parts.iter().all(|p| p.matches(tags)),
            Self::Or(parts) => parts.iter().any(|p| p.matches(tags)),
            Self::Not(inner) => !inner.matches(tags),
            Self::HasTag { category, values } => tags
                .get(category)
                .is_some_and(|assigned| assigned.iter().any(|v| values.contains(v))),
            Self::InCategory { category } => tags.get(category).is_some_and(|v| !v.is_empty()),
            Self::Tagged => tags.values().any(|v| !v.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> TagMap {
        let mut map = TagMap::new();
        for (cat, val) in pairs {
            map.entry((*cat).to_string())
                .or_default()
                .push((*val).to_string());
        }
        map
    }

    #[test]
    fn test_has_tag_requires_category_and_value() {
        let file = tags(&[("colour", "blue")]);
        assert!(Predicate::has_tag("colour", "blue").matches(&file));
        assert!(!Predicate::has_tag("colour", "red").matches(&file));
        assert!(!Predicate::has_tag("size", "blue").matches(&file));
    }

    #[test]
    fn test_has_any_tag_is_or_over_values() {
        let file = tags(&[("colour", "crimson")]);
        let pred = Predicate::has_any_tag("colour", vec!["red".into(), "crimson".into()]);
        assert!(pred.matches(&file));
    }

    #[test]
    fn test_unassigned_only_looks_at_its_category() {
        let file = tags(&[("colour", "blue")]);
        assert!(Predicate::unassigned("rating").matches(&file));
        assert!(!Predicate::unassigned("colour").matches(&file));
    }

    #[test]
    fn test_untagged() {
        assert!(Predicate::untagged().matches(&TagMap::new()));
        assert!(!Predicate::untagged().matches(&tags(&[("a", "b")])));
    }

    #[test]
    fn test_empty_and_or() {
        let file = tags(&[("a", "b")]);
        assert!(Predicate::And(vec![]).matches(&file));
        assert!(!Predicate::Or(vec![]).matches(&file));
    }

    #[test]
    fn test_multi_valued_category() {
        let file = tags(&[("colour", "blue"), ("colour", "green")]);
        let pred = Predicate::And(vec![
            Predicate::has_tag("colour", "blue"),
            Predicate::has_tag("colour", "green"),
        ]);
        assert!(pred.matches(&file));
    }
}
