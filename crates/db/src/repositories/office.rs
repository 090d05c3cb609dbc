//! Office repository.

use aip_core::hierarchy::{HierarchyError, Office};
use aip_shared::AppError;
use aip_shared::types::OfficeId;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::{hierarchy_nodes, offices};

/// Error types for office operations.
#[derive(Debug, thiserror::Error)]
pub enum OfficeError {
    /// Another office already has the same code tuple.
    #[error("Office code {0} already exists")]
    DuplicateCode(String),

    /// Office not found.
    #[error("Office not found: {0}")]
    NotFound(OfficeId),

    /// Office still owns hierarchy nodes.
    #[error("Office {office_id} is referenced by {nodes} hierarchy nodes")]
    InUse {
        /// The office.
        office_id: OfficeId,
        /// Number of referencing nodes.
        nodes: u64,
    },

    /// Invalid office code segments.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<OfficeError> for AppError {
    fn from(err: OfficeError) -> Self {
        let message = err.to_string();
        match err {
            OfficeError::Hierarchy(inner) => inner.into(),
            OfficeError::DuplicateCode(_) => Self::Conflict(message),
            OfficeError::NotFound(_) => Self::NotFound(message),
            OfficeError::InUse { .. } => Self::BusinessRule(message),
            OfficeError::Database(_) => Self::Database(message),
        }
    }
}

/// Input for creating an office.
#[derive(Debug, Clone)]
pub struct CreateOfficeInput {
    /// Sector code (up to 2 characters).
    pub sector_code: String,
    /// LGU level code (1 character).
    pub lgu_level_code: String,
    /// Office type code (up to 2 characters).
    pub office_type_code: String,
    /// Office code (up to 3 characters).
    pub code: String,
    /// Office name.
    pub name: String,
    /// Local Economic Enterprise flag.
    pub is_lee: bool,
}

/// Office repository.
#[derive(Debug, Clone)]
pub struct OfficeRepository {
    db: DatabaseConnection,
}

impl OfficeRepository {
    /// Creates a new office repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an office after validating its code segments.
    ///
    /// # Errors
    ///
    /// - `Hierarchy(InvalidOfficeCode)` for an empty, too wide or non-alphanumeric segment.
    /// - `DuplicateCode` if the code tuple is taken.
    pub async fn create(&self, input: CreateOfficeInput) -> Result<Office, OfficeError> {
        let mut office = Office {
            id: OfficeId::new(),
            sector_code: input.sector_code.trim().to_string(),
            lgu_level_code: input.lgu_level_code.trim().to_string(),
            office_type_code: input.office_type_code.trim().to_string(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            is_lee: input.is_lee,
        };
        let full_code = office.full_code()?;

        // Store padded segments so that "1" and "01" are the same office.
        let padded: Vec<&str> = full_code.split('-').collect();
        if let [sector, lgu_level, office_type, code] = padded.as_slice() {
            office.sector_code = (*sector).to_string();
            office.lgu_level_code = (*lgu_level).to_string();
            office.office_type_code = (*office_type).to_string();
            office.code = (*code).to_string();
        }

        let existing = offices::Entity::find()
            .filter(offices::Column::SectorCode.eq(&office.sector_code))
            .filter(offices::Column::LguLevelCode.eq(&office.lgu_level_code))
            .filter(offices::Column::OfficeTypeCode.eq(&office.office_type_code))
            .filter(offices::Column::Code.eq(&office.code))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(OfficeError::DuplicateCode(full_code));
        }

        offices::ActiveModel {
            id: Set(office.id.into_inner()),
            sector_code: Set(office.sector_code.clone()),
            lgu_level_code: Set(office.lgu_level_code.clone()),
            office_type_code: Set(office.office_type_code.clone()),
            code: Set(office.code.clone()),
            name: Set(office.name.clone()),
            is_lee: Set(office.is_lee),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(office_id = %office.id, %full_code, "created office");
        Ok(office)
    }

    /// Finds an office by ID.
    pub async fn find(&self, id: OfficeId) -> Result<Option<Office>, OfficeError> {
        Ok(offices::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .map(Office::from))
    }

    /// Lists all offices ordered by code.
    pub async fn list(&self) -> Result<Vec<Office>, OfficeError> {
        Ok(offices::Entity::find()
            .order_by_asc(offices::Column::SectorCode)
            .order_by_asc(offices::Column::LguLevelCode)
            .order_by_asc(offices::Column::OfficeTypeCode)
            .order_by_asc(offices::Column::Code)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Office::from)
            .collect())
    }

    /// Returns an office's full account code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the office does not exist.
    pub async fn full_code(&self, id: OfficeId) -> Result<String, OfficeError> {
        let office = self.find(id).await?.ok_or(OfficeError::NotFound(id))?;
        Ok(office.full_code()?)
    }

    /// Deletes an office that no hierarchy node references.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the office does not exist.
    /// - `InUse` if any node references it.
    pub async fn delete(&self, id: OfficeId) -> Result<(), OfficeError> {
        let nodes = hierarchy_nodes::Entity::find()
            .filter(hierarchy_nodes::Column::OfficeId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        if nodes > 0 {
            return Err(OfficeError::InUse { office_id: id, nodes });
        }

        let result = offices::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(OfficeError::NotFound(id));
        }

        tracing::info!(office_id = %id, "deleted office");
        Ok(())
    }
}
