//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the HTTP request bodies that feed the entity
//! - `Serialize` DTOs for composite response payloads

pub mod dataset;
pub mod download_task;
pub mod status;
pub mod system_config;
