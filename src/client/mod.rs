//! Generation client adapter.

mod provider;
pub mod providers;
mod types;

pub use provider::GenerationClient;
pub use types::{
    AspectRatio, GeneratedVideoEntry, ImageFormat, VideoOperation, VideoRef, VideoResponse,
};
