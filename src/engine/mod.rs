pub mod report;
pub mod table;

pub use report::*;
pub use table::*;

use thiserror::Error;

use crate::shoe::ShoeError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Shoe(#[from] ShoeError),
    #[error("please provide a sequence")]
    EmptySequence,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TableError {
    /// Caller mistakes as opposed to storage trouble
    pub fn is_rejection(&self) -> bool {
        !matches!(self, TableError::Storage(_))
    }
}
