pub mod layout;

pub use layout::{ArtifactLayout, StreamFormat};
