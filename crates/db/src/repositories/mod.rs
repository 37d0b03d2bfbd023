//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Every race-sensitive
//! read-modify-write sequence (claim, sweep, complete) runs inside a
//! transaction here, guarded by row locks and status-predicate CAS updates.

pub mod dataset_repo;
pub mod download_task_repo;
pub mod system_config_repo;

pub use dataset_repo::DatasetRepo;
pub use download_task_repo::DownloadTaskRepo;
pub use system_config_repo::SystemConfigRepo;
