//! Office/PPA hierarchy: full-code composition and sibling suffix allocation.
//!
//! This module implements:
//! - Office account codes and node full codes (`code`)
//! - Next-suffix allocation under a parent or an office (`sequence`)
//! - Child-kind and office-inheritance rules for new nodes (`types`)
//! - A storage-backed service tying them together (`service`)

pub mod code;
pub mod error;
pub mod sequence;
pub mod service;
pub mod types;

#[cfg(test)]
mod props;

pub use code::{CodeIndex, compose_full_code};
pub use error::HierarchyError;
pub use sequence::{MAX_SUFFIX, SuffixPolicy, next_suffix, suffix_number};
pub use service::{HierarchyService, HierarchyStore};
pub use types::{
    HierarchyNode, NewNode, NodeKind, Office, PreparedNode, SiblingScope, validate_child_kind,
};
