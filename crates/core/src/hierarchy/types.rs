//! Office and hierarchy node data types.

use std::fmt;
use std::str::FromStr;

use aip_shared::types::{NodeId, OfficeId};
use serde::{Deserialize, Serialize};

use super::error::HierarchyError;

/// Zero-padded width of the sector segment of an office code.
pub const SECTOR_WIDTH: usize = 2;
/// Zero-padded width of the LGU-level segment of an office code.
pub const LGU_LEVEL_WIDTH: usize = 1;
/// Zero-padded width of the office-type segment of an office code.
pub const OFFICE_TYPE_WIDTH: usize = 2;
/// Zero-padded width of the office's own code segment.
pub const OFFICE_CODE_WIDTH: usize = 3;

/// An organizational unit that owns Programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Office {
    /// Office ID.
    pub id: OfficeId,
    /// Sector code (e.g. `01` for general public services).
    pub sector_code: String,
    /// LGU-level code.
    pub lgu_level_code: String,
    /// Office-type code.
    pub office_type_code: String,
    /// The office's own 1 to 3 character code.
    pub code: String,
    /// Office name.
    pub name: String,
    /// Whether the office is a Local Economic Enterprise.
    pub is_lee: bool,
}

impl Office {
    /// Composes the office account code `{sector}-{lgu_level}-{office_type}-{code}`,
    /// zero-padding every segment to its fixed width.
    ///
    /// # Errors
    ///
    /// Returns `HierarchyError::InvalidOfficeCode` if a segment is empty or
    /// wider than its slot.
    pub fn full_code(&self) -> Result<String, HierarchyError> {
        Ok(format!(
            "{}-{}-{}-{}",
            pad_segment("sector", &self.sector_code, SECTOR_WIDTH)?,
            pad_segment("lgu_level", &self.lgu_level_code, LGU_LEVEL_WIDTH)?,
            pad_segment("office_type", &self.office_type_code, OFFICE_TYPE_WIDTH)?,
            pad_segment("code", &self.code, OFFICE_CODE_WIDTH)?,
        ))
    }
}

fn pad_segment(segment: &'static str, value: &str, width: usize) -> Result<String, HierarchyError> {
    let value = value.trim();
    if value.is_empty()
        || value.len() > width
        || !value.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(HierarchyError::InvalidOfficeCode {
            segment,
            value: value.to_string(),
        });
    }
    Ok(format!("{value:0>width$}"))
}

/// Kind of a hierarchy node, ordered from coarsest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Top-level program, owned directly by an office.
    Program,
    /// Project under a program.
    Project,
    /// Activity under a project.
    Activity,
    /// Sub-activity under an activity or another sub-activity.
    SubActivity,
}

impl NodeKind {
    /// The only kind a child of this kind may have.
    ///
    /// Sub-Activity is the finest granularity and nests under itself.
    #[must_use]
    pub const fn child_kind(self) -> Self {
        match self {
            Self::Program => Self::Project,
            Self::Project => Self::Activity,
            Self::Activity | Self::SubActivity => Self::SubActivity,
        }
    }

    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Program => "program",
            Self::Project => "project",
            Self::Activity => "activity",
            Self::SubActivity => "sub_activity",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = HierarchyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "program" => Ok(Self::Program),
            "project" => Ok(Self::Project),
            "activity" => Ok(Self::Activity),
            "sub_activity" | "subactivity" => Ok(Self::SubActivity),
            _ => Err(HierarchyError::InvalidNodeKind(s.to_string())),
        }
    }
}

/// Checks that a node of kind `child` may be created under `parent`
/// (or as a root when `parent` is `None`).
///
/// # Errors
///
/// Returns `HierarchyError::RootMustBeProgram` for a non-Program root and
/// `HierarchyError::InvalidChildKind` for a child at the wrong level.
pub fn validate_child_kind(
    parent: Option<NodeKind>,
    child: NodeKind,
) -> Result<(), HierarchyError> {
    match parent {
        None if child == NodeKind::Program => Ok(()),
        None => Err(HierarchyError::RootMustBeProgram(child)),
        Some(parent) if parent.child_kind() == child => Ok(()),
        Some(parent) => Err(HierarchyError::InvalidChildKind { parent, child }),
    }
}

/// A Program, Project, Activity or Sub-Activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Node ID.
    pub id: NodeId,
    /// Node kind.
    pub kind: NodeKind,
    /// Title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// This level's code segment, typically three zero-padded digits.
    pub code_suffix: String,
    /// Parent node; `None` only for Programs.
    pub parent_id: Option<NodeId>,
    /// Owning office (inherited from the parent when not given explicitly).
    pub office_id: OfficeId,
    /// Whether the node is still offered for new fiscal years.
    pub is_active: bool,
}

impl HierarchyNode {
    /// Scope in which this node's suffix must be unique.
    #[must_use]
    pub fn sibling_scope(&self) -> SiblingScope {
        self.parent_id
            .map_or(SiblingScope::Root(self.office_id), SiblingScope::Children)
    }
}

/// The set of nodes a code suffix must be unique within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiblingScope {
    /// Root Programs of an office.
    Root(OfficeId),
    /// Direct children of a node.
    Children(NodeId),
}

impl fmt::Display for SiblingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root(office_id) => write!(f, "root programs of office {office_id}"),
            Self::Children(node_id) => write!(f, "children of node {node_id}"),
        }
    }
}

/// Input for creating a new hierarchy node.
#[derive(Debug, Clone)]
pub struct NewNode {
    /// Node kind.
    pub kind: NodeKind,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Parent node, `None` for a Program.
    pub parent_id: Option<NodeId>,
    /// Owning office; required for roots, inherited from the parent otherwise.
    pub office_id: Option<OfficeId>,
}

/// A validated node with its allocated suffix, ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedNode {
    /// ID assigned to the new node.
    pub id: NodeId,
    /// Node kind.
    pub kind: NodeKind,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Parent node.
    pub parent_id: Option<NodeId>,
    /// Resolved owning office.
    pub office_id: OfficeId,
    /// Allocated suffix.
    pub code_suffix: String,
    /// Full code the node will have once inserted.
    pub full_code: String,
}

impl PreparedNode {
    /// Converts the prepared node into the node that gets stored.
    #[must_use]
    pub fn into_node(self) -> HierarchyNode {
        HierarchyNode {
            id: self.id,
            kind: self.kind,
            title: self.title,
            description: self.description,
            code_suffix: self.code_suffix,
            parent_id: self.parent_id,
            office_id: self.office_id,
            is_active: true,
        }
    }
}
