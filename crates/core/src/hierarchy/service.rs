//! Hierarchy service: code composition and suffix allocation against storage.

use std::collections::HashSet;
use std::future::Future;

use aip_shared::types::{NodeId, OfficeId};

use super::code::compose_full_code;
use super::error::HierarchyError;
use super::sequence::{SuffixPolicy, next_suffix};
use super::types::{
    HierarchyNode, NewNode, Office, PreparedNode, SiblingScope, validate_child_kind,
};

/// Read access to the Office/PPA hierarchy.
///
/// This trait is implemented by the db crate, usually bound to an open
/// transaction so that reads and the following insert share one snapshot.
pub trait HierarchyStore: Send + Sync {
    /// Find a node by ID.
    fn find_node(
        &self,
        id: NodeId,
    ) -> impl Future<Output = Result<Option<HierarchyNode>, HierarchyError>> + Send;

    /// Find an office by ID.
    fn find_office(
        &self,
        id: OfficeId,
    ) -> impl Future<Output = Result<Option<Office>, HierarchyError>> + Send;

    /// List the code suffixes of every node in a sibling scope.
    fn list_sibling_suffixes(
        &self,
        scope: SiblingScope,
    ) -> impl Future<Output = Result<Vec<String>, HierarchyError>> + Send;
}

impl<S: HierarchyStore> HierarchyStore for &S {
    fn find_node(
        &self,
        id: NodeId,
    ) -> impl Future<Output = Result<Option<HierarchyNode>, HierarchyError>> + Send {
        (**self).find_node(id)
    }

    fn find_office(
        &self,
        id: OfficeId,
    ) -> impl Future<Output = Result<Option<Office>, HierarchyError>> + Send {
        (**self).find_office(id)
    }

    fn list_sibling_suffixes(
        &self,
        scope: SiblingScope,
    ) -> impl Future<Output = Result<Vec<String>, HierarchyError>> + Send {
        (**self).list_sibling_suffixes(scope)
    }
}

/// Hierarchy service for code composition and child preparation.
pub struct HierarchyService<S: HierarchyStore> {
    store: S,
    policy: SuffixPolicy,
}

impl<S: HierarchyStore> HierarchyService<S> {
    /// Create a new hierarchy service.
    #[must_use]
    pub fn new(store: S, policy: SuffixPolicy) -> Self {
        Self { store, policy }
    }

    /// Composes the full code of a stored node by walking its ancestors.
    ///
    /// Every call re-reads the chain; nothing is cached across calls.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node itself does not exist, and
    /// `BrokenAncestry`, `MissingOffice` or `AncestryCycle` if its chain is corrupt.
    pub async fn compose_full_code(&self, node_id: NodeId) -> Result<String, HierarchyError> {
        let node = self
            .store
            .find_node(node_id)
            .await?
            .ok_or(HierarchyError::NodeNotFound(node_id))?;

        let (chain, office) = self.load_ancestry(node).await?;
        let code = compose_full_code(
            &chain[0],
            |id| chain.iter().find(|n| n.id == id),
            |id| (office.id == id).then_some(&office),
        )?;

        tracing::debug!(%node_id, %code, "composed full code");
        Ok(code)
    }

    /// Computes the next unused suffix in a sibling scope.
    ///
    /// # Errors
    ///
    /// Returns `SequenceExhausted` past 999 siblings, `InvalidSuffix` in
    /// strict mode, or a storage error.
    pub async fn allocate_next_suffix(
        &self,
        scope: SiblingScope,
    ) -> Result<String, HierarchyError> {
        let siblings = self.store.list_sibling_suffixes(scope).await?;
        let suffix = next_suffix(&siblings, self.policy).map_err(|err| match err {
            HierarchyError::SequenceExhausted { .. } => HierarchyError::SequenceExhausted {
                scope: scope.to_string(),
            },
            other => other,
        })?;

        tracing::debug!(%scope, siblings = siblings.len(), %suffix, "allocated suffix");
        Ok(suffix)
    }

    /// Validates a new node, resolves its office, allocates its suffix and
    /// computes the full code it will have.
    ///
    /// The caller must insert the result in the same transaction the store
    /// is reading from, after locking the parent (or the office for a root).
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the parent does not exist.
    /// - `OfficeRequired` / `OfficeNotFound` for a root without a valid office.
    /// - `RootMustBeProgram` / `InvalidChildKind` for a kind at the wrong level.
    /// - Any composition or allocation error.
    pub async fn prepare_child(&self, input: &NewNode) -> Result<PreparedNode, HierarchyError> {
        let (office_id, scope, parent_code) = match input.parent_id {
            Some(parent_id) => {
                let parent = self
                    .store
                    .find_node(parent_id)
                    .await?
                    .ok_or(HierarchyError::NodeNotFound(parent_id))?;
                validate_child_kind(Some(parent.kind), input.kind)?;

                let office_id = input.office_id.unwrap_or(parent.office_id);
                if input.office_id.is_some() {
                    self.require_office(office_id).await?;
                }
                let parent_code = self.compose_full_code(parent_id).await?;
                (office_id, SiblingScope::Children(parent_id), parent_code)
            }
            None => {
                validate_child_kind(None, input.kind)?;
                let office_id = input.office_id.ok_or(HierarchyError::OfficeRequired)?;
                let office = self.require_office(office_id).await?;
                (office_id, SiblingScope::Root(office_id), office.full_code()?)
            }
        };

        let code_suffix = self.allocate_next_suffix(scope).await?;
        let full_code = format!("{parent_code}-{code_suffix}");

        Ok(PreparedNode {
            id: NodeId::new(),
            kind: input.kind,
            title: input.title.trim().to_string(),
            description: input.description.clone(),
            parent_id: input.parent_id,
            office_id,
            code_suffix,
            full_code,
        })
    }

    async fn require_office(&self, office_id: OfficeId) -> Result<Office, HierarchyError> {
        self.store
            .find_office(office_id)
            .await?
            .ok_or(HierarchyError::OfficeNotFound(office_id))
    }

    /// Loads `node` and its ancestors (node first) plus the root's office.
    async fn load_ancestry(
        &self,
        node: HierarchyNode,
    ) -> Result<(Vec<HierarchyNode>, Office), HierarchyError> {
        let mut seen = HashSet::from([node.id]);
        let mut chain = vec![node];

        loop {
            let current = &chain[chain.len() - 1];
            let Some(parent_id) = current.parent_id else {
                break;
            };
            let current_id = current.id;
            let parent = self.store.find_node(parent_id).await?.ok_or(
                HierarchyError::BrokenAncestry {
                    node_id: current_id,
                    missing_parent: parent_id,
                },
            )?;
            if !seen.insert(parent.id) {
                return Err(HierarchyError::AncestryCycle(parent.id));
            }
            chain.push(parent);
        }

        let root = &chain[chain.len() - 1];
        let office = self.store.find_office(root.office_id).await?.ok_or(
            HierarchyError::MissingOffice {
                node_id: root.id,
                office_id: root.office_id,
            },
        )?;
        Ok((chain, office))
    }
}
