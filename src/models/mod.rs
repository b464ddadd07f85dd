//! Data models for the annotation service.
//!
//! Request structs deserialize with defaults so that missing fields surface as
//! validation errors rather than JSON rejections.

mod entry;
mod identifier;
mod team;
mod user;
mod vote;

pub use entry::*;
pub use identifier::*;
pub use team::*;
pub use user::*;
pub use vote::*;

use crate::errors::AppError;

/// Reject empty (or whitespace-only) required string fields.
pub(crate) fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::missing(field));
    }
    Ok(())
}
