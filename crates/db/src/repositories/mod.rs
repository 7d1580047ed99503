//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod job_repo;
pub mod job_stats_save_repo;
pub mod user_repo;

pub use job_repo::JobRepo;
pub use job_stats_save_repo::JobStatsSaveRepo;
pub use user_repo::UserRepo;
