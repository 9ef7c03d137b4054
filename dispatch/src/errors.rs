use std::io;

use thiserror::Error;

use crate::vtable::TableError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
