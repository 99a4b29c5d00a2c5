//! Host for running Amiga narrator.device and translator.library binaries
//! on an emulated 68000: hunk loading, resident-tag decoding, a scripted
//! boot trampoline, and an exec.library ABI stand-in that satisfies the
//! guests' system calls.

pub mod abi;
pub mod boot;
pub mod error;
pub mod hunk;
pub mod layout;
pub mod machine;
pub mod mem;
pub mod narrator;
pub mod resident;
pub mod translator;

pub use abi::{AbiError, ExecVector, NarratorAbi};
pub use boot::{build_narrator_trampoline, build_translator_trampoline, Trampoline};
pub use error::Error;
pub use hunk::{load_image, LoadError, LoadedImage};
pub use machine::{Halt, Machine, StepObserver};
pub use mem::EmulatedRam;
pub use narrator::run_narrator;
pub use resident::{ResidentError, ResidentFlags, RomTag};
pub use translator::run_translator;
