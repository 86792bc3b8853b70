//! Tag filters
//!
//! Filters are expressed as a [`Predicate`] tree and compiled to SQL in one
//! place ([`compile`]). The [`resolver`] builds predicates from
//! `category/value` request paths, widening each value to its configured
//! alias group.

mod compile;
pub mod error;
mod predicate;
pub mod resolver;

pub use compile::{SqlFilter, compile};
pub use error::FilterError;
pub use predicate::Predicate;
pub use resolver::{
    Breadcrumb, FilterResolver, FilteredFileList, TagFilter, UNASSIGNED, build_predicate,
    expand_aliases, parse_filter_path,
};
