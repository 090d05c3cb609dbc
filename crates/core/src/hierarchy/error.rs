//! Hierarchy error types.

use aip_shared::AppError;
use aip_shared::types::{NodeId, OfficeId};
use thiserror::Error;

use super::types::NodeKind;

/// Errors raised while composing codes, allocating suffixes, or validating
/// the shape of the Office/PPA hierarchy.
#[derive(Debug, Error)]
pub enum HierarchyError {
    // ========== Composition Errors ==========
    /// A parent reference points at a node that does not exist.
    #[error("Broken ancestry: node {node_id} references missing parent {missing_parent}")]
    BrokenAncestry {
        /// The node whose parent is missing.
        node_id: NodeId,
        /// The dangling parent reference.
        missing_parent: NodeId,
    },

    /// The owning office of a root node does not exist.
    #[error("Broken ancestry: node {node_id} references missing office {office_id}")]
    MissingOffice {
        /// The root node.
        node_id: NodeId,
        /// The dangling office reference.
        office_id: OfficeId,
    },

    /// Following parent references loops back onto a node already visited.
    #[error("Ancestry cycle detected at node {0}")]
    AncestryCycle(NodeId),

    /// An office code segment is empty, too wide, or not alphanumeric.
    #[error("Invalid office code segment {segment}: '{value}'")]
    InvalidOfficeCode {
        /// Segment name.
        segment: &'static str,
        /// Offending value.
        value: String,
    },

    // ========== Allocation Errors ==========
    /// More than 999 siblings under one parent.
    #[error("No code suffix left for {scope}: the limit is 999 entries")]
    SequenceExhausted {
        /// Human-readable sibling scope.
        scope: String,
    },

    /// An existing sibling suffix is not numeric (strict mode only).
    #[error("Existing sibling suffix '{0}' is not numeric")]
    InvalidSuffix(String),

    /// Storage rejected the allocated code as a duplicate.
    #[error("Code {0} is already taken, please retry")]
    DuplicateCode(String),

    // ========== Shape Errors ==========
    /// Node not found.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Office not found.
    #[error("Office not found: {0}")]
    OfficeNotFound(OfficeId),

    /// A root node was given without an office.
    #[error("A Program needs an owning office")]
    OfficeRequired,

    /// Roots must be Programs.
    #[error("Only a Program can be created without a parent, got {0}")]
    RootMustBeProgram(NodeKind),

    /// The child kind is not one level below its parent.
    #[error("A {child} cannot be created under a {parent}")]
    InvalidChildKind {
        /// Parent kind.
        parent: NodeKind,
        /// Requested child kind.
        child: NodeKind,
    },

    /// Unknown node kind string.
    #[error("Unknown node kind: {0}")]
    InvalidNodeKind(String),

    // ========== Storage Errors ==========
    /// The storage collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl HierarchyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BrokenAncestry { .. } | Self::MissingOffice { .. } => "BROKEN_ANCESTRY",
            Self::AncestryCycle(_) => "ANCESTRY_CYCLE",
            Self::InvalidOfficeCode { .. } => "INVALID_OFFICE_CODE",
            Self::SequenceExhausted { .. } => "SEQUENCE_EXHAUSTED",
            Self::InvalidSuffix(_) => "INVALID_SUFFIX",
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::NodeNotFound(_) => "NODE_NOT_FOUND",
            Self::OfficeNotFound(_) => "OFFICE_NOT_FOUND",
            Self::OfficeRequired => "OFFICE_REQUIRED",
            Self::RootMustBeProgram(_) => "ROOT_MUST_BE_PROGRAM",
            Self::InvalidChildKind { .. } => "INVALID_CHILD_KIND",
            Self::InvalidNodeKind(_) => "INVALID_NODE_KIND",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true if the error means stored data is corrupt.
    #[must_use]
    pub const fn is_incident(&self) -> bool {
        matches!(
            self,
            Self::BrokenAncestry { .. }
                | Self::MissingOffice { .. }
                | Self::AncestryCycle(_)
                | Self::InvalidSuffix(_)
                | Self::Storage(_)
        )
    }
}

impl From<HierarchyError> for AppError {
    fn from(err: HierarchyError) -> Self {
        let message = err.to_string();
        match err {
            HierarchyError::NodeNotFound(_) | HierarchyError::OfficeNotFound(_) => {
                Self::NotFound(message)
            }
            HierarchyError::InvalidOfficeCode { .. }
            | HierarchyError::OfficeRequired
            | HierarchyError::RootMustBeProgram(_)
            | HierarchyError::InvalidChildKind { .. }
            | HierarchyError::InvalidNodeKind(_) => Self::Validation(message),
            HierarchyError::SequenceExhausted { .. } => Self::BusinessRule(message),
            HierarchyError::DuplicateCode(_) => Self::Conflict(message),
            HierarchyError::BrokenAncestry { .. }
            | HierarchyError::MissingOffice { .. }
            | HierarchyError::AncestryCycle(_)
            | HierarchyError::InvalidSuffix(_) => Self::DataIntegrity(message),
            HierarchyError::Storage(_) => Self::Database(message),
        }
    }
}
