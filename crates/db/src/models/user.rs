//! User entity model and DTOs.
//!
//! Users are only modelled as far as projects need them: something an
//! owner / lead column can point at.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use taskforge_core::types::{DbId, Timestamp};
use validator::Validate;

/// A user row from the `users` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
}
