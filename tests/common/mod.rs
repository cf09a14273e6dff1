//! Scripted collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use genstudio::{
    AspectRatio, CredentialGate, GenStudioError, GenerationClient, InMemoryMediaRegistry,
    MediaHandle, MediaRegistry, VideoOperation,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const VIDEO_URI: &str = "https://example.test/files/video.mp4";
pub const VIDEO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42";

/// Which adapter operation was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Text,
    Image,
    Speech,
    VideoFromPrompt,
    VideoFromImage,
}

/// How a scripted poll answers.
#[derive(Debug, Clone)]
pub enum PollReply {
    Pending,
    Done,
    DoneEmpty,
    NotFound,
}

/// Scripted failure for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NotFound,
    Server,
}

impl Failure {
    fn to_error(self) -> GenStudioError {
        match self {
            Failure::NotFound => {
                GenStudioError::EntityNotFound("Requested entity was not found.".into())
            }
            Failure::Server => GenStudioError::Api {
                status: 500,
                message: "internal error".into(),
            },
        }
    }
}

pub fn png_base64() -> String {
    let mut png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&[0u8; 8]);
    base64::engine::general_purpose::STANDARD.encode(png)
}

pub fn pcm_base64() -> String {
    base64::engine::general_purpose::STANDARD.encode([0u8, 1, 2, 3, 4, 5, 6, 7])
}

/// A [`GenerationClient`] that answers from a script and records every call.
pub struct MockClient {
    text_reply: String,
    speech_audio: bool,
    failure: Option<(CallKind, Failure)>,
    polls: Mutex<VecDeque<PollReply>>,
    calls: Mutex<Vec<CallKind>>,
    poll_count: AtomicUsize,
    download_count: AtomicUsize,
    in_flight: AtomicUsize,
    overlapped: AtomicBool,
    image_hold: Option<Arc<Notify>>,
    image_held: AtomicBool,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            text_reply: "hola, soy un robot".into(),
            speech_audio: true,
            failure: None,
            polls: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            poll_count: AtomicUsize::new(0),
            download_count: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            overlapped: AtomicBool::new(false),
            image_hold: None,
            image_held: AtomicBool::new(false),
        }
    }
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers successive polls from `replies`; pending once exhausted.
    pub fn with_polls(self, replies: impl IntoIterator<Item = PollReply>) -> Self {
        *self.polls.lock().unwrap() = replies.into_iter().collect();
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text_reply = text.into();
        self
    }

    /// Speech calls return no audio.
    pub fn without_speech(mut self) -> Self {
        self.speech_audio = false;
        self
    }

    pub fn failing(mut self, kind: CallKind, failure: Failure) -> Self {
        self.failure = Some((kind, failure));
        self
    }

    /// The first image call waits until `release` is notified.
    pub fn holding_first_image(mut self, release: Arc<Notify>) -> Self {
        self.image_hold = Some(release);
        self
    }

    pub fn calls(&self) -> Vec<CallKind> {
        self.calls.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.poll_count.load(Ordering::SeqCst)
    }

    pub fn download_count(&self) -> usize {
        self.download_count.load(Ordering::SeqCst)
    }

    /// True if two adapter calls were ever in flight together.
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    fn enter(&self, kind: CallKind) -> Result<InFlight<'_>, GenStudioError> {
        self.calls.lock().unwrap().push(kind);
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        let guard = InFlight(&self.in_flight);
        match self.failure {
            Some((failing, failure)) if failing == kind => Err(failure.to_error()),
            _ => Ok(guard),
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GenerationClient for MockClient {
    async fn generate_text(&self, _prompt: &str, _model: &str) -> genstudio::Result<String> {
        let _guard = self.enter(CallKind::Text)?;
        tokio::task::yield_now().await;
        Ok(self.text_reply.clone())
    }

    async fn generate_image(
        &self,
        _prompt: &str,
        _aspect_ratio: AspectRatio,
    ) -> genstudio::Result<String> {
        let _guard = self.enter(CallKind::Image)?;
        if let Some(release) = &self.image_hold {
            if !self.image_held.swap(true, Ordering::SeqCst) {
                release.notified().await;
            }
        }
        tokio::task::yield_now().await;
        Ok(png_base64())
    }

    async fn generate_speech(
        &self,
        _text: &str,
        _voice: Option<&str>,
    ) -> genstudio::Result<Option<String>> {
        let _guard = self.enter(CallKind::Speech)?;
        tokio::task::yield_now().await;
        Ok(self.speech_audio.then(pcm_base64))
    }

    async fn generate_video_from_prompt(
        &self,
        _prompt: &str,
        _aspect_ratio: AspectRatio,
        _high_quality: bool,
    ) -> genstudio::Result<VideoOperation> {
        let _guard = self.enter(CallKind::VideoFromPrompt)?;
        Ok(VideoOperation::pending("models/veo/operations/mock"))
    }

    async fn generate_video_from_image(
        &self,
        _prompt: &str,
        _image_base64: &str,
        _mime_type: &str,
        _aspect_ratio: AspectRatio,
        _high_quality: bool,
    ) -> genstudio::Result<VideoOperation> {
        let _guard = self.enter(CallKind::VideoFromImage)?;
        Ok(VideoOperation::pending("models/veo/operations/mock"))
    }

    async fn poll_video_operation(
        &self,
        operation: &VideoOperation,
    ) -> genstudio::Result<VideoOperation> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PollReply::Pending);
        match reply {
            PollReply::Pending => Ok(VideoOperation::pending(operation.name.clone())),
            PollReply::Done => Ok(VideoOperation::finished(operation.name.clone(), VIDEO_URI)),
            PollReply::DoneEmpty => Ok(VideoOperation::finished_empty(operation.name.clone())),
            PollReply::NotFound => Err(Failure::NotFound.to_error()),
        }
    }

    async fn download_video(&self, uri: &str) -> genstudio::Result<Vec<u8>> {
        assert_eq!(uri, VIDEO_URI);
        self.download_count.fetch_add(1, Ordering::SeqCst);
        Ok(VIDEO_BYTES.to_vec())
    }
}

/// Registry that counts creates and releases on top of an in-memory store.
#[derive(Default)]
pub struct TrackingRegistry {
    pub inner: InMemoryMediaRegistry,
    created: AtomicUsize,
    released: AtomicUsize,
}

impl TrackingRegistry {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Handles created and not yet released.
    pub fn live(&self) -> usize {
        self.inner.live_count()
    }
}

impl MediaRegistry for TrackingRegistry {
    fn create(&self, data: Vec<u8>, mime_type: &str) -> MediaHandle {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.inner.create(data, mime_type)
    }

    fn release(&self, handle: &MediaHandle) {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.inner.release(handle);
    }
}

/// Credential gate with a fixed key state that counts how often it opens.
pub struct MockGate {
    has_key: bool,
    opened: AtomicUsize,
}

impl MockGate {
    pub fn new(has_key: bool) -> Self {
        Self {
            has_key,
            opened: AtomicUsize::new(0),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialGate for MockGate {
    async fn has_selected_api_key(&self) -> bool {
        self.has_key
    }

    async fn open_select_key(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
    }
}
