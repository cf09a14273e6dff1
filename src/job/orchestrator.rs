//! Drives workflows stage by stage, polls video operations and owns cleanup.

use crate::client::{GenerationClient, ImageFormat, VideoOperation};
use crate::config::OrchestratorConfig;
use crate::credential::CredentialGate;
use crate::error::GenStudioError;
use crate::job::error::{JobError, JobErrorKind};
use crate::job::messages::LoadingMessageCycle;
use crate::job::task::{cancel_slot, ScheduledTask};
use crate::job::types::{Artifact, GenerationJob, JobSnapshot, JobState, StageCall, StageName};
use crate::job::workflow::Workflow;
use crate::media::{pcm_to_wav, InMemoryMediaRegistry, MediaRegistry, PCM_CHANNELS, PCM_SAMPLE_RATE};
use crate::share::{ShareHandler, SharePayload};
use base64::Engine;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Builder for [`JobOrchestrator`].
pub struct JobOrchestratorBuilder {
    client: Arc<dyn GenerationClient>,
    media: Option<Arc<dyn MediaRegistry>>,
    gate: Option<Arc<dyn CredentialGate>>,
    config: Option<OrchestratorConfig>,
}

impl JobOrchestratorBuilder {
    /// Sets the registry that receives binary artifacts. Defaults to a fresh
    /// [`InMemoryMediaRegistry`].
    pub fn media_registry(mut self, media: Arc<dyn MediaRegistry>) -> Self {
        self.media = Some(media);
        self
    }

    /// Installs the host's credential gate. Without one, a key is assumed ready.
    pub fn credential_gate(mut self, gate: Arc<dyn CredentialGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sets timing configuration. Defaults to `OrchestratorConfig::builder().build()`.
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> JobOrchestrator {
        let (snapshots, _) = watch::channel(JobSnapshot::default());
        JobOrchestrator {
            shared: Arc::new(Shared {
                client: self.client,
                media: self
                    .media
                    .unwrap_or_else(|| Arc::new(InMemoryMediaRegistry::new())),
                gate: self.gate,
                config: self
                    .config
                    .unwrap_or_else(|| OrchestratorConfig::builder().build()),
                inner: Mutex::new(Inner::default()),
                snapshots,
            }),
        }
    }
}

/// Runs one generation job at a time.
///
/// Submitting a new job supersedes the current one: its timers stop, its
/// media handles are released and any result it still produces is dropped.
/// Dropping the orchestrator tears everything down the same way.
pub struct JobOrchestrator {
    shared: Arc<Shared>,
}

impl JobOrchestrator {
    /// Creates a builder around a generation client.
    pub fn builder(client: Arc<dyn GenerationClient>) -> JobOrchestratorBuilder {
        JobOrchestratorBuilder {
            client,
            media: None,
            gate: None,
            config: None,
        }
    }

    /// Starts a job for `workflow` and returns its generation number.
    ///
    /// Invalid input fails the job immediately without touching the service.
    pub async fn submit<W: Workflow + 'static>(&self, workflow: W) -> u64 {
        let workflow: Arc<dyn Workflow> = Arc::new(workflow);
        let generation = self.shared.reset(workflow.name(), workflow.stages());

        if let Err(err) = workflow.validate() {
            self.shared.fail(generation, None, err).await;
            return generation;
        }

        if let Some(gate) = &self.shared.gate {
            if !gate.has_selected_api_key().await {
                tracing::info!(job = generation, "no API key selected, opening key selection");
                gate.open_select_key().await;
            }
        }

        Shared::start(&self.shared, generation, workflow);
        generation
    }

    /// Subscribes to job snapshots.
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> JobSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// Number of live poll and message timers.
    pub fn active_timers(&self) -> usize {
        let inner = self.shared.lock();
        [&inner.poll_timer, &inner.message_timer]
            .into_iter()
            .flatten()
            .filter(|task| task.is_active())
            .count()
    }

    /// Hands the finished job's primary artifact to a share handler.
    pub async fn share(&self, handler: &dyn ShareHandler) -> crate::Result<SharePayload> {
        let payload = self.snapshot().share_payload().ok_or_else(|| {
            GenStudioError::InvalidRequest("nothing to share until the job finishes".into())
        })?;
        handler.share(payload.clone()).await?;
        Ok(payload)
    }

    /// Stops every task and releases every media handle.
    pub fn shutdown(&self) {
        self.shared.teardown();
    }
}

impl Drop for JobOrchestrator {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

struct Shared {
    client: Arc<dyn GenerationClient>,
    media: Arc<dyn MediaRegistry>,
    gate: Option<Arc<dyn CredentialGate>>,
    config: OrchestratorConfig,
    inner: Mutex<Inner>,
    snapshots: watch::Sender<JobSnapshot>,
}

#[derive(Default)]
struct Inner {
    job: GenerationJob,
    messages: Option<LoadingMessageCycle>,
    driver: Option<ScheduledTask>,
    poll_timer: Option<ScheduledTask>,
    message_timer: Option<ScheduledTask>,
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.job.generation == generation
    }

    fn stop_timers(&mut self) {
        cancel_slot(&mut self.poll_timer);
        cancel_slot(&mut self.message_timer);
        self.messages = None;
    }
}

enum StageOutput {
    Text(String),
    Image {
        base64: String,
        mime_type: &'static str,
        bytes: Vec<u8>,
    },
    Audio(Vec<u8>),
    Video(Vec<u8>),
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.snapshots.send_replace(JobSnapshot {
            job: inner.job.clone(),
            loading_message: inner
                .messages
                .as_ref()
                .and_then(|m| m.current())
                .map(str::to_string),
        });
    }

    /// Invalidates the current job and installs a fresh idle one.
    fn reset(&self, workflow: &'static str, stages: Vec<StageName>) -> u64 {
        let mut inner = self.lock();
        inner.stop_timers();
        if let Some(driver) = inner.driver.take() {
            driver.detach();
        }
        for handle in inner.job.artifacts.drain_media() {
            self.media.release(&handle);
        }

        let generation = inner.job.generation + 1;
        inner.job = GenerationJob {
            generation,
            workflow,
            stages,
            ..GenerationJob::default()
        };
        self.publish(&inner);
        tracing::debug!(job = generation, workflow, "job created");
        generation
    }

    fn teardown(&self) {
        let mut inner = self.lock();
        inner.stop_timers();
        if let Some(mut driver) = inner.driver.take() {
            driver.cancel();
        }
        let released = inner.job.artifacts.drain_media();
        for handle in &released {
            self.media.release(handle);
        }

        let generation = inner.job.generation + 1;
        inner.job = GenerationJob {
            generation,
            ..GenerationJob::default()
        };
        self.publish(&inner);
        tracing::debug!(released = released.len(), "orchestrator torn down");
    }

    fn start(self: &Arc<Self>, generation: u64, workflow: Arc<dyn Workflow>) {
        let mut inner = self.lock();
        if !inner.is_current(generation) {
            return;
        }

        let Some(&first) = inner.job.stages.first() else {
            inner.job.state = JobState::Done;
            self.publish(&inner);
            return;
        };

        inner.job.state = JobState::Running(first);
        self.publish(&inner);
        tracing::info!(job = generation, workflow = workflow.name(), stages = inner.job.stages.len(), "job started");
        inner.driver = Some(ScheduledTask::spawn(
            Arc::clone(self).drive(generation, workflow, 0),
        ));
    }

    /// Runs stages from `from` on, in order. Returns after the last inline
    /// stage, or once a video stage has handed off to its poll timer.
    async fn drive(self: Arc<Self>, generation: u64, workflow: Arc<dyn Workflow>, from: usize) {
        let stages = workflow.stages();

        for (index, &stage) in stages.iter().enumerate().skip(from) {
            let artifacts = {
                let inner = self.lock();
                if !inner.is_current(generation) {
                    return;
                }
                inner.job.artifacts.clone()
            };

            let call = match workflow.stage_call(stage, &artifacts) {
                Ok(call) => call,
                Err(err) => {
                    self.fail(generation, Some(stage), err).await;
                    return;
                }
            };

            tracing::info!(job = generation, %stage, "stage started");

            if call.is_video() {
                self.start_message_cycle(generation);
                match self.submit_video(&call).await {
                    Ok(operation) => {
                        tracing::debug!(job = generation, operation = %operation.name, "video operation submitted");
                        self.start_polling(generation, workflow, index, operation);
                    }
                    Err(err) => self.fail(generation, Some(stage), JobError::classify(&err)).await,
                }
                return;
            }

            match self.run_stage(call).await {
                Ok(output) => {
                    if !self.commit(generation, &stages, index, output) {
                        return;
                    }
                }
                Err(err) => {
                    self.fail(generation, Some(stage), err).await;
                    return;
                }
            }
        }
    }

    async fn run_stage(&self, call: StageCall) -> Result<StageOutput, JobError> {
        match call {
            StageCall::Text { prompt, model } => {
                let text = self.client.generate_text(&prompt, &model).await?;
                let text = text.trim();
                if text.is_empty() {
                    return Err(JobError::empty_result("The text model returned nothing"));
                }
                Ok(StageOutput::Text(text.to_string()))
            }
            StageCall::Image {
                prompt,
                aspect_ratio,
            } => {
                let base64 = self.client.generate_image(&prompt, aspect_ratio).await?;
                let bytes = decode_base64(&base64, "image")?;
                if bytes.is_empty() {
                    return Err(JobError::empty_result("The image service returned no image"));
                }
                let mime_type = ImageFormat::from_magic_bytes(&bytes)
                    .unwrap_or_default()
                    .mime_type();
                Ok(StageOutput::Image {
                    base64,
                    mime_type,
                    bytes,
                })
            }
            StageCall::Speech { text, voice } => {
                let audio = self.client.generate_speech(&text, voice.as_deref()).await?;
                let pcm = match audio {
                    Some(b64) => decode_base64(&b64, "audio")?,
                    None => Vec::new(),
                };
                if pcm.len() < 2 {
                    return Err(JobError::empty_result("The speech service returned no audio"));
                }
                Ok(StageOutput::Audio(pcm_to_wav(&pcm, PCM_SAMPLE_RATE, PCM_CHANNELS)?))
            }
            StageCall::VideoFromPrompt { .. } | StageCall::VideoFromImage { .. } => Err(
                JobError::transport("video stages are polled, not run inline"),
            ),
        }
    }

    async fn submit_video(&self, call: &StageCall) -> crate::Result<VideoOperation> {
        match call {
            StageCall::VideoFromPrompt {
                prompt,
                aspect_ratio,
                high_quality,
            } => {
                self.client
                    .generate_video_from_prompt(prompt, *aspect_ratio, *high_quality)
                    .await
            }
            StageCall::VideoFromImage {
                prompt,
                image_base64,
                mime_type,
                aspect_ratio,
                high_quality,
            } => {
                self.client
                    .generate_video_from_image(
                        prompt,
                        image_base64,
                        mime_type,
                        *aspect_ratio,
                        *high_quality,
                    )
                    .await
            }
            _ => Err(GenStudioError::InvalidRequest(
                "not a video stage call".into(),
            )),
        }
    }

    /// Stores a stage's output and advances to the next declared stage.
    ///
    /// Returns false when the job was superseded; nothing is stored then.
    fn commit(&self, generation: u64, stages: &[StageName], index: usize, output: StageOutput) -> bool {
        let stage = stages[index];
        let mut inner = self.lock();
        if !inner.is_current(generation) {
            tracing::debug!(job = generation, %stage, "dropping result of superseded job");
            return false;
        }
        if inner.job.artifacts.contains(stage) {
            tracing::warn!(job = generation, %stage, "stage already has an artifact");
            return false;
        }

        let leaves_video = matches!(output, StageOutput::Video(_));
        let artifact = self.materialize(output);
        inner.job.artifacts.insert(stage, artifact);

        if leaves_video {
            cancel_slot(&mut inner.message_timer);
            inner.messages = None;
        }

        match stages.get(index + 1) {
            Some(&next) => inner.job.state = JobState::Running(next),
            None => {
                inner.job.state = JobState::Done;
                inner.stop_timers();
            }
        }
        self.publish(&inner);

        tracing::info!(job = generation, %stage, "stage completed");
        if inner.job.state == JobState::Done {
            tracing::info!(job = generation, artifacts = inner.job.artifacts.len(), "job done");
        }
        true
    }

    fn materialize(&self, output: StageOutput) -> Artifact {
        match output {
            StageOutput::Text(text) => Artifact::Text { text },
            StageOutput::Image {
                base64,
                mime_type,
                bytes,
            } => Artifact::Image {
                media: self.media.create(bytes, mime_type),
                mime_type: mime_type.to_string(),
                base64: base64.into(),
            },
            StageOutput::Audio(wav) => Artifact::Audio {
                media: self.media.create(wav, "audio/wav"),
            },
            StageOutput::Video(bytes) => Artifact::Video {
                media: self.media.create(bytes, "video/mp4"),
            },
        }
    }

    /// Moves the job to its terminal error and stops its timers.
    async fn fail(&self, generation: u64, stage: Option<StageName>, err: JobError) {
        {
            let mut inner = self.lock();
            if !inner.is_current(generation) {
                tracing::debug!(job = generation, error = %err, "dropping error of superseded job");
                return;
            }
            inner.stop_timers();
            inner.job.state = JobState::Error;
            inner.job.error = Some(err.clone());
            self.publish(&inner);
        }

        let stage = stage.map(|s| s.as_str()).unwrap_or("submit");
        match err.kind {
            JobErrorKind::Validation => {
                tracing::warn!(job = generation, stage, error = %err.message, "job rejected")
            }
            kind => {
                tracing::error!(job = generation, stage, ?kind, error = %err.message, "job failed")
            }
        }

        if err.kind == JobErrorKind::Credential {
            if let Some(gate) = &self.gate {
                gate.open_select_key().await;
            }
        }
    }

    fn start_message_cycle(self: &Arc<Self>, generation: u64) {
        let mut inner = self.lock();
        if !inner.is_current(generation) {
            return;
        }
        cancel_slot(&mut inner.message_timer);
        inner.messages = Some(LoadingMessageCycle::new(self.config.loading_messages.clone()));
        self.publish(&inner);

        let shared = Arc::clone(self);
        let period = self.config.message_interval;
        inner.message_timer = Some(ScheduledTask::spawn(async move {
            let mut ticks = ScheduledTask::ticker(period);
            loop {
                ticks.tick().await;
                if !shared.advance_message(generation) {
                    break;
                }
            }
        }));
    }

    fn advance_message(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if !inner.is_current(generation) {
            return false;
        }
        match inner.messages.as_mut() {
            Some(cycle) => {
                cycle.advance();
            }
            None => return false,
        }
        self.publish(&inner);
        true
    }

    fn start_polling(
        self: &Arc<Self>,
        generation: u64,
        workflow: Arc<dyn Workflow>,
        index: usize,
        operation: VideoOperation,
    ) {
        let mut inner = self.lock();
        if !inner.is_current(generation) {
            return;
        }
        cancel_slot(&mut inner.poll_timer);
        inner.poll_timer = Some(ScheduledTask::spawn(
            Arc::clone(self).poll_until_done(generation, workflow, index, operation),
        ));
    }

    /// Poll timer body: one status query per tick until the operation is done.
    async fn poll_until_done(
        self: Arc<Self>,
        generation: u64,
        workflow: Arc<dyn Workflow>,
        index: usize,
        mut operation: VideoOperation,
    ) {
        let stages = workflow.stages();
        let stage = stages[index];
        let mut ticks = ScheduledTask::ticker(self.config.poll_interval);
        let mut attempts: u32 = 0;

        let outcome = loop {
            ticks.tick().await;
            attempts += 1;

            operation = match self.client.poll_video_operation(&operation).await {
                Ok(next) => next,
                Err(err) => break Err(JobError::classify(&err)),
            };

            if !operation.done {
                tracing::debug!(job = generation, operation = %operation.name, attempt = attempts, "video still rendering");
                if let Some(max) = self.config.max_poll_attempts.filter(|&max| max > 0) {
                    if attempts >= max {
                        break Err(JobError::transport(format!(
                            "video generation did not finish after {attempts} status checks"
                        )));
                    }
                }
                continue;
            }

            let Some(uri) = operation.result_uri().map(str::to_string) else {
                break Err(JobError::empty_result(
                    "Video generation finished without returning a video",
                ));
            };
            break match self.client.download_video(&uri).await {
                Ok(bytes) if bytes.is_empty() => {
                    Err(JobError::empty_result("The downloaded video was empty"))
                }
                Ok(bytes) => Ok(bytes),
                Err(err) => Err(JobError::classify(&err)),
            };
        };

        self.release_poll_timer(generation);
        match outcome {
            Ok(bytes) => {
                let has_more = index + 1 < stages.len();
                if self.commit(generation, &stages, index, StageOutput::Video(bytes)) && has_more {
                    self.continue_after_video(generation, workflow, index + 1);
                }
            }
            Err(err) => self.fail(generation, Some(stage), err).await,
        }
    }

    /// Lets the running poll task finish without aborting itself.
    fn release_poll_timer(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.is_current(generation) {
            if let Some(task) = inner.poll_timer.take() {
                task.detach();
            }
        }
    }

    fn continue_after_video(self: &Arc<Self>, generation: u64, workflow: Arc<dyn Workflow>, from: usize) {
        let mut inner = self.lock();
        if !inner.is_current(generation) {
            return;
        }
        inner.driver = Some(ScheduledTask::spawn(
            Arc::clone(self).drive(generation, workflow, from),
        ));
    }
}

fn decode_base64(data: &str, what: &str) -> Result<Vec<u8>, JobError> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| JobError::classify(&GenStudioError::Decode(format!("{what}: {e}"))))
}
