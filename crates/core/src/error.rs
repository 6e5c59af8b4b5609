use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A unique value (project key, project slug, user email) is already taken,
    /// soft-deleted rows included.
    #[error("Duplicate {entity} {field}: '{value}' is already taken")]
    Uniqueness {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// A foreign key points at a row that does not exist.
    #[error("Invalid reference: {field} {id} does not exist")]
    Reference { field: &'static str, id: DbId },
}
