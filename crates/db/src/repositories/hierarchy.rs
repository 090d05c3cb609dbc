//! Hierarchy repository: node creation with suffix allocation, master tree listing.

use aip_core::aip::{AipRow, build_tree, master_rows};
use aip_core::hierarchy::{
    HierarchyError, HierarchyNode, HierarchyService, NewNode, Office, PreparedNode, SuffixPolicy,
};
use aip_core::tree::AssembledTree;
use aip_shared::AppError;
use aip_shared::config::EngineConfig;
use aip_shared::types::NodeId;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::convert::nodes_from_models;
use crate::entities::{hierarchy_nodes, offices};
use crate::store::SeaStore;

/// Error types for hierarchy operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Engine error (validation, allocation, composition).
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<NodeError> for AppError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Hierarchy(inner) => inner.into(),
            NodeError::Database(db) => Self::Database(db.to_string()),
        }
    }
}

/// Hierarchy repository.
#[derive(Debug, Clone)]
pub struct HierarchyRepository {
    db: DatabaseConnection,
    engine: EngineConfig,
}

impl HierarchyRepository {
    /// Creates a new hierarchy repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, engine: EngineConfig) -> Self {
        Self { db, engine }
    }

    fn policy(&self) -> SuffixPolicy {
        SuffixPolicy::from(&self.engine)
    }

    /// Creates a node, allocating the next suffix in its sibling scope.
    ///
    /// The parent row (or the office row for a root Program) is locked for
    /// the duration of the allocation and insert. A lost race against the
    /// storage uniqueness rules is retried `engine.create_retries` times
    /// before `DuplicateCode` reaches the caller.
    ///
    /// # Errors
    ///
    /// Any validation, allocation or composition error from the engine,
    /// `DuplicateCode` after the retries are used up, or a database error.
    pub async fn create_node(&self, input: NewNode) -> Result<PreparedNode, NodeError> {
        let attempts = self.engine.create_retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            match self.try_create_node(&input).await {
                Err(NodeError::Hierarchy(HierarchyError::DuplicateCode(code)))
                    if attempt < attempts =>
                {
                    tracing::warn!(attempt, %code, "lost suffix allocation race, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_create_node(&self, input: &NewNode) -> Result<PreparedNode, NodeError> {
        let txn = self.db.begin().await?;
        lock_scope(&txn, input).await?;

        let service = HierarchyService::new(SeaStore::new(&txn), self.policy());
        let prepared = service.prepare_child(input).await?;

        let now = Utc::now().fixed_offset();
        let insert = hierarchy_nodes::ActiveModel {
            id: Set(prepared.id.into_inner()),
            kind: Set(prepared.kind.as_str().to_string()),
            title: Set(prepared.title.clone()),
            description: Set(prepared.description.clone()),
            code_suffix: Set(prepared.code_suffix.clone()),
            parent_id: Set(prepared.parent_id.map(NodeId::into_inner)),
            office_id: Set(prepared.office_id.into_inner()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await;

        if let Err(err) = insert {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                return Err(HierarchyError::DuplicateCode(prepared.full_code).into());
            }
            return Err(err.into());
        }

        txn.commit().await?;
        tracing::info!(
            node_id = %prepared.id,
            kind = %prepared.kind,
            full_code = %prepared.full_code,
            "created hierarchy node"
        );
        Ok(prepared)
    }

    /// Finds a node by ID.
    pub async fn find(&self, id: NodeId) -> Result<Option<HierarchyNode>, NodeError> {
        hierarchy_nodes::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .map(HierarchyNode::try_from)
            .transpose()
            .map_err(NodeError::from)
    }

    /// Composes a node's full code from its current ancestry.
    pub async fn full_code(&self, id: NodeId) -> Result<String, NodeError> {
        let service = HierarchyService::new(SeaStore::new(&self.db), self.policy());
        Ok(service.compose_full_code(id).await?)
    }

    /// Lists every node of the master hierarchy in one query.
    pub async fn list_all(&self) -> Result<Vec<HierarchyNode>, NodeError> {
        let models = hierarchy_nodes::Entity::find()
            .order_by_asc(hierarchy_nodes::Column::CreatedAt)
            .order_by_asc(hierarchy_nodes::Column::Id)
            .all(&self.db)
            .await?;
        Ok(nodes_from_models(models)?)
    }

    /// The master hierarchy as a tree, optionally filtered by a search query.
    pub async fn master_tree(
        &self,
        search: Option<&str>,
    ) -> Result<AssembledTree<AipRow>, NodeError> {
        let nodes = self.list_all().await?;
        let offices: Vec<Office> = offices::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(Office::from)
            .collect();

        let rows = master_rows(nodes, &offices)?;
        Ok(build_tree(rows, search))
    }

    /// Activates or deactivates a node. Inactive nodes are not offered for import.
    pub async fn set_active(&self, id: NodeId, is_active: bool) -> Result<(), NodeError> {
        let model = hierarchy_nodes::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(HierarchyError::NodeNotFound(id))?;

        let mut active: hierarchy_nodes::ActiveModel = model.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(&self.db).await?;

        tracing::info!(node_id = %id, is_active, "updated node status");
        Ok(())
    }

    /// Renames a node. Codes never change after creation.
    pub async fn update_title(
        &self,
        id: NodeId,
        title: &str,
        description: Option<String>,
    ) -> Result<(), NodeError> {
        let model = hierarchy_nodes::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(HierarchyError::NodeNotFound(id))?;

        let mut active: hierarchy_nodes::ActiveModel = model.into();
        active.title = Set(title.trim().to_string());
        active.description = Set(description);
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(&self.db).await?;
        Ok(())
    }
}

/// Locks the row that owns the sibling scope the new node will join.
async fn lock_scope(txn: &DatabaseTransaction, input: &NewNode) -> Result<(), NodeError> {
    match (input.parent_id, input.office_id) {
        (Some(parent_id), _) => {
            hierarchy_nodes::Entity::find_by_id(parent_id.into_inner())
                .lock_exclusive()
                .one(txn)
                .await?
                .ok_or(HierarchyError::NodeNotFound(parent_id))?;
        }
        (None, Some(office_id)) => {
            offices::Entity::find_by_id(office_id.into_inner())
                .lock_exclusive()
                .one(txn)
                .await?
                .ok_or(HierarchyError::OfficeNotFound(office_id))?;
        }
        (None, None) => return Err(HierarchyError::OfficeRequired.into()),
    }
    Ok(())
}
