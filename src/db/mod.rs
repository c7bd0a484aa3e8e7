use crate::models::{NewShortLink, ShortLink};
use async_trait::async_trait;
use diesel::result::DatabaseErrorKind;
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::MemoryDb;
pub use postgres::PostgresDb;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    General(String),
    #[error("Duplicate short code")]
    DuplicateCode,
}

impl From<diesel::result::Error> for DbError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                DbError::DuplicateCode
            }
            _ => DbError::General(e.to_string()),
        }
    }
}

impl From<deadpool::managed::PoolError<diesel_async::pooled_connection::PoolError>> for DbError {
    fn from(e: deadpool::managed::PoolError<diesel_async::pooled_connection::PoolError>) -> Self {
        DbError::General(e.to_string())
    }
}

/// Storage port for short links.
///
/// Backends report a taken `short_code` as [`DbError::DuplicateCode`] so
/// callers can retry with a fresh code regardless of the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinksDB: Send + Sync {
    /// Persists `link` and returns it with its store-assigned id.
    async fn create(&self, link: &NewShortLink) -> Result<ShortLink, DbError>;
    async fn get(&self, short_code: &str) -> Result<Option<ShortLink>, DbError>;
    /// Bumps the click counter of `short_code`. Unknown codes are a no-op.
    async fn increment_clicks(&self, short_code: &str) -> Result<(), DbError>;
}
