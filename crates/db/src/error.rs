use taskforge_core::error::CoreError;
use taskforge_core::types::DbId;

/// PostgreSQL SQLSTATE for a unique constraint violation.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for a foreign key violation.
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL SQLSTATE for a CHECK constraint violation.
const PG_CHECK_VIOLATION: &str = "23514";

/// Unique constraints by name, with the entity and field they guard.
const UNIQUE_CONSTRAINTS: &[(&str, &str, &str)] = &[
    ("uq_projects_key", "project", "key"),
    ("uq_projects_slug", "project", "slug"),
    ("uq_users_email", "user", "email"),
];

/// Foreign keys by name, with the referencing column.
const FOREIGN_KEYS: &[(&str, &str)] = &[
    ("projects_owner_id_fkey", "owner_id"),
    ("projects_lead_id_fkey", "lead_id"),
];

/// Error type for store operations.
///
/// Domain failures surface as [`CoreError`]; anything the database reports
/// that has no domain meaning stays a raw [`sqlx::Error`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(core) => Some(core),
            Self::Database(_) => None,
        }
    }
}

/// Values the failing statement tried to write, used to fill in error
/// details when a constraint fires.
#[derive(Debug, Default, Clone, Copy)]
pub struct Attempted<'a> {
    pub values: &'a [(&'static str, &'a str)],
    pub references: &'a [(&'static str, Option<DbId>)],
}

/// Returns `true` if `err` is a unique violation on the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION)
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

/// Translate a sqlx error into the domain taxonomy where possible.
///
/// - Unique violations on a known `uq_*` constraint become
///   [`CoreError::Uniqueness`].
/// - Foreign key violations on owner / lead become [`CoreError::Reference`].
/// - CHECK violations become [`CoreError::Validation`].
/// - Everything else is passed through as [`StoreError::Database`].
pub fn classify(err: sqlx::Error, attempted: Attempted<'_>) -> StoreError {
    let (code, constraint) = match err.as_database_error() {
        Some(db_err) => (
            db_err.code().map(|c| c.into_owned()),
            db_err.constraint().unwrap_or("unknown").to_string(),
        ),
        None => return StoreError::Database(err),
    };

    match code.as_deref() {
        Some(PG_UNIQUE_VIOLATION) => {
            if let Some((_, entity, field)) =
                UNIQUE_CONSTRAINTS.iter().find(|(name, _, _)| *name == constraint)
            {
                let value = attempted
                    .values
                    .iter()
                    .find(|(f, _)| f == field)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default();
                return CoreError::Uniqueness {
                    entity: *entity,
                    field: *field,
                    value,
                }
                .into();
            }
        }
        Some(PG_FOREIGN_KEY_VIOLATION) => {
            if let Some((_, field)) = FOREIGN_KEYS.iter().find(|(name, _)| *name == constraint) {
                let id = attempted
                    .references
                    .iter()
                    .find(|(f, _)| f == field)
                    .and_then(|(_, id)| *id)
                    .unwrap_or_default();
                return CoreError::Reference { field: *field, id }.into();
            }
        }
        Some(PG_CHECK_VIOLATION) => {
            return CoreError::Validation(format!("Value violates constraint {constraint}")).into();
        }
        _ => {}
    }

    tracing::error!(error = %err, constraint = %constraint, "Unclassified database error");
    StoreError::Database(err)
}
