pub mod error;
pub mod loader;
pub mod types;

pub use error::LoadError;
pub use loader::{load_image, LoadedImage};
pub use types::HunkType;
