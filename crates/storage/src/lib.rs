//! Storage Layer
//!
//! Document-style persistence for accounts, sessions and unsafe-area
//! reports behind a repository.

mod repository;

pub use repository::{
    NewReport, NewUser, Repository, ReportRecord, Session, User, UserUpdate,
};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
    #[error("Duplicate record: {0}")]
    Duplicate(String),
}
