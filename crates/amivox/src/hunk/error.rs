use thiserror::Error;

/// Errors that can occur while loading a hunk image into emulated RAM.
///
/// Every variant names the offending tag value or file offset so a bad
/// image can be diagnosed from the message alone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// File is too short to contain the expected data.
    #[error("at offset {offset:#x}: need {needed} bytes, only {available} available")]
    TooShort {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// File does not start with HUNK_HEADER (0x000003F3).
    #[error("not a hunk load file: expected HUNK_HEADER 0x3F3, found {found:#010x}")]
    MissingHeader { found: u32 },

    /// Encountered a type ID outside the load-file subset.
    #[error("unhandled hunk type {tag:#x} at offset {offset:#x}")]
    UnknownHunkType { tag: u32, offset: usize },

    /// The header's resident-library-name longword was non-zero.
    #[error("resident library names are not supported ({value:#x} at offset {offset:#x})")]
    ResidentNames { value: u32, offset: usize },

    /// More content hunks than the header declared.
    #[error("content hunk {index} exceeds the {declared} hunks declared by the header")]
    UnexpectedHunk { index: usize, declared: u32 },

    /// A RELOC32 record refers to a hunk that was never loaded.
    #[error("RELOC32 refers to hunk {hunk} but only {loaded} hunks are loaded")]
    RelocHunkOutOfRange { hunk: u32, loaded: usize },

    /// The image does not fit in emulated RAM.
    #[error("image requires {required:#x} bytes of emulated RAM, only {available:#x} present")]
    ImageOverflow { required: u64, available: usize },
}
