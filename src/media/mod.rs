//! Locally addressable media resources.
//!
//! Every binary artifact a job produces is registered here and handed to the
//! presentation layer as a [`MediaHandle`]. Handles must be released once the
//! job that created them is superseded or torn down.

mod audio;

pub use audio::{pcm_to_wav, PCM_CHANNELS, PCM_SAMPLE_RATE};

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// A revocable reference to an in-memory media resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MediaHandle {
    url: String,
    mime_type: String,
    size: usize,
}

impl MediaHandle {
    /// Creates a handle for a resource already stored under `url`.
    pub fn new(url: impl Into<String>, mime_type: impl Into<String>, size: usize) -> Self {
        Self {
            url: url.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    /// The address under which the resource is resolvable.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// MIME type of the resource.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the resource in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Creates and revokes media resources.
pub trait MediaRegistry: Send + Sync {
    /// Stores `data` and returns a handle addressing it.
    fn create(&self, data: Vec<u8>, mime_type: &str) -> MediaHandle;

    /// Revokes a handle. Releasing an unknown or already released handle is a no-op.
    fn release(&self, handle: &MediaHandle);
}

/// Process-local registry handing out `blob:genstudio/<uuid>` URLs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMediaRegistry {
    resources: Arc<Mutex<HashMap<String, Arc<Vec<u8>>>>>,
}

impl InMemoryMediaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a URL to its bytes while the handle is live.
    pub fn get(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.lock().get(url).cloned()
    }

    /// Number of live (unreleased) resources.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Vec<u8>>>> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaRegistry for InMemoryMediaRegistry {
    fn create(&self, data: Vec<u8>, mime_type: &str) -> MediaHandle {
        let url = format!("blob:genstudio/{}", uuid::Uuid::new_v4());
        let handle = MediaHandle::new(url.clone(), mime_type, data.len());
        self.lock().insert(url, Arc::new(data));
        tracing::trace!(url = %handle.url, mime_type, "media resource created");
        handle
    }

    fn release(&self, handle: &MediaHandle) {
        if self.lock().remove(&handle.url).is_some() {
            tracing::trace!(url = %handle.url, "media resource released");
        }
    }
}
