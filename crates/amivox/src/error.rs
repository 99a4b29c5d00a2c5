use thiserror::Error;

use crate::abi::AbiError;
use crate::hunk::LoadError;
use crate::resident::ResidentError;

/// Unified error type for the amivox library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("resident tag error: {0}")]
    Resident(#[from] ResidentError),

    #[error("abi error: {0}")]
    Abi(#[from] AbiError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
