pub mod dispatch;
pub mod vector;

pub use dispatch::NarratorAbi;
pub use vector::ExecVector;

use thiserror::Error;

/// Errors raised by the library-call dispatcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    /// The guest called a system vector the host does not model.
    #[error("unhandled library vector {offset:#06x} at pc {pc:#x}")]
    UnknownVector { offset: u16, pc: u32 },

    /// The guest replied a message before the host delivered one.
    #[error("guest replied at pc {pc:#x} before any message was delivered")]
    ReplyBeforeGetMsg { pc: u32 },
}
