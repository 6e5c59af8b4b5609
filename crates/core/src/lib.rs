//! Domain logic for TaskForge projects.
//!
//! Nothing in here touches the database, so the same rules apply to the
//! repository layer, the admin tooling and any future API surface.

pub mod error;
pub mod listing;
pub mod project;
pub mod types;
