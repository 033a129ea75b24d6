use std::sync::Arc;
use std::time::Instant;

use crate::models::config::CaptureConfiguration;
use crate::models::error::{CaptureError, ValidationError};
use crate::models::lock::LockStatus;
use crate::models::media::{AssetSource, MediaAsset, MediaFile};
use crate::models::profile::{ProfileDetails, SavedVideo};
use crate::models::state::CaptureState;
use crate::processing::cancel::CancellationToken;
use crate::processing::pipeline::{MediaPipeline, ProcessedMedia};
use crate::session::preview::{PreviewHandle, PreviewRegistry, PreviewTarget};
use crate::session::recording::RecordingSession;
use crate::session::stream_manager::StreamResourceManager;
use crate::storage::{publisher, retention};
use crate::traits::capture_backend::CaptureBackend;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::clock::{Clock, SystemClock};
use crate::traits::persistence::PersistenceGateway;

/// A captured or uploaded file waiting for the media pipeline.
///
/// Owns everything it needs, so it can be run on another thread and its
/// outcome handed back through [`CaptureController::complete_processing`].
#[derive(Debug)]
pub struct ProcessingJob {
    generation: u64,
    file: MediaFile,
    source: AssetSource,
    recorded_secs: Option<f64>,
    cancel: CancellationToken,
}

impl ProcessingJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn file(&self) -> &MediaFile {
        &self.file
    }

    pub fn source(&self) -> AssetSource {
        self.source
    }

    /// Token the controller cancels when this job goes stale.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn run(self, pipeline: &MediaPipeline) -> ProcessingOutcome {
        let ProcessingJob {
            generation,
            file,
            source,
            recorded_secs,
            cancel,
        } = self;

        let result = match pipeline.validate(&file, source).into_parts() {
            Ok((duration, _)) => Ok(pipeline.process_validated(file, duration, source, &cancel)),
            Err(reason) => Err(Rejected { reason, raw: file }),
        };
        ProcessingOutcome {
            generation,
            source,
            recorded_secs,
            result,
        }
    }
}

/// A file that failed validation, returned so a recording can fall back to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub reason: ValidationError,
    pub raw: MediaFile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOutcome {
    pub generation: u64,
    pub source: AssetSource,
    pub recorded_secs: Option<f64>,
    pub result: Result<ProcessedMedia, Rejected>,
}

/// Intro video capture state machine.
///
/// Sole owner of the device stream (through [`StreamResourceManager`]) and of
/// the in-progress recording. Time-driven transitions (countdown, recording
/// limit) happen in [`poll`](Self::poll), which the caller invokes from its
/// event loop.
///
/// ```text
/// [CaptureBackend] → [StreamResourceManager] → chunks → [RecordingSession]
///                                                              ↓ stop
///                 [MediaPipeline] ← ProcessingJob ←────── raw file
///                        ↓
///                 ProcessingOutcome → complete_processing → ReadyForReview
///                                                              ↓ accept + save
///                                               [PersistenceGateway] → Saved
/// ```
pub struct CaptureController<B: CaptureBackend> {
    config: CaptureConfiguration,
    streams: StreamResourceManager<B>,
    previews: PreviewRegistry,
    clock: Arc<dyn Clock>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    state: CaptureState,
    countdown_started: Option<Instant>,
    recording: Option<RecordingSession>,
    // Bumped whenever an in-flight processing result must be ignored.
    generation: u64,
    in_flight: Option<CancellationToken>,
    asset: Option<MediaAsset>,
    saved: Option<SavedVideo>,
}

impl<B: CaptureBackend> CaptureController<B> {
    pub fn new(backend: B, config: CaptureConfiguration) -> Result<Self, CaptureError> {
        Self::with_clock(backend, config, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: B, config: CaptureConfiguration, clock: Arc<dyn Clock>) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::Configuration)?;
        Ok(Self {
            config,
            streams: StreamResourceManager::new(backend),
            previews: PreviewRegistry::new(),
            clock,
            delegate: None,
            state: CaptureState::Idle,
            countdown_started: None,
            recording: None,
            generation: 0,
            in_flight: None,
            asset: None,
            saved: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> CaptureState {
        self.state.clone()
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    pub fn streams(&self) -> &StreamResourceManager<B> {
        &self.streams
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.previews.current()
    }

    /// The asset under review (or being saved).
    pub fn asset(&self) -> Option<&MediaAsset> {
        self.asset.as_ref()
    }

    pub fn saved(&self) -> Option<&SavedVideo> {
        self.saved.as_ref()
    }

    pub fn recording_buffered_bytes(&self) -> usize {
        self.recording.as_ref().map(RecordingSession::buffered_bytes).unwrap_or(0)
    }

    /// Request the camera and start the countdown. Transitions: idle → requesting → previewing.
    pub fn start_capture(&mut self) -> Result<(), CaptureError> {
        self.require(CaptureState::is_idle, "start capture")?;
        self.set_state(CaptureState::Requesting);

        let stream_id = match self.streams.acquire(&self.config.constraints) {
            Ok(stream) => stream.id.clone(),
            Err(e) => return self.abort(e.into()),
        };
        self.previews.create(PreviewTarget::LiveStream(stream_id));
        self.countdown_started = Some(self.clock.instant());

        let countdown = self.config.countdown_secs;
        self.set_state(CaptureState::Previewing {
            countdown_remaining: countdown,
        });
        if countdown == 0 {
            return self.begin_recording();
        }
        self.notify_countdown(countdown);
        Ok(())
    }

    /// Advance time-driven transitions: countdown ticks, the countdown
    /// reaching zero, and the recording limit. Returns a job when the
    /// recording limit stopped the recording.
    pub fn poll(&mut self) -> Result<Option<ProcessingJob>, CaptureError> {
        let now = self.clock.instant();
        match self.state.clone() {
            CaptureState::Previewing { countdown_remaining } => {
                let elapsed = self
                    .countdown_started
                    .map(|start| now.saturating_duration_since(start).as_secs())
                    .unwrap_or(0);
                let remaining = u64::from(self.config.countdown_secs).saturating_sub(elapsed) as u32;
                if remaining == 0 {
                    self.begin_recording()?;
                } else if remaining < countdown_remaining {
                    self.set_state(CaptureState::Previewing {
                        countdown_remaining: remaining,
                    });
                    self.notify_countdown(remaining);
                }
                Ok(None)
            }
            CaptureState::Recording { .. } => {
                let elapsed = self.recording.as_ref().map(|r| r.elapsed_secs(now)).unwrap_or(0.0);
                match self.config.max_recording_secs {
                    Some(max) if elapsed >= max => {
                        log::info!("Recording reached the {:.0}s limit; stopping", max);
                        self.stop_recording().map(Some)
                    }
                    _ => {
                        self.set_state(CaptureState::Recording { duration_secs: elapsed });
                        Ok(None)
                    }
                }
            }
            _ => Ok(None),
        }
    }

    /// Stop recording and release the camera. Transitions: recording → processing.
    pub fn stop_recording(&mut self) -> Result<ProcessingJob, CaptureError> {
        self.require(CaptureState::is_recording, "stop recording")?;
        let Some(session) = self.recording.take() else {
            return Err(self.invalid_state("stop recording"));
        };

        if let Err(e) = self.streams.stop_recording() {
            log::warn!("Recorder did not stop cleanly: {}", e);
        }
        self.streams.release();
        self.previews.revoke_all();

        let recorded_secs = session.elapsed_secs(self.clock.instant());
        let file = session.into_file();
        log::info!(
            "Recording stopped after {:.1}s: {} ({} bytes)",
            recorded_secs,
            file.name,
            file.size_bytes()
        );

        self.set_state(CaptureState::Processing);
        Ok(self.issue_job(file, AssetSource::Recorded, Some(recorded_secs)))
    }

    /// Hand an uploaded file to the pipeline. Transitions: idle → processing.
    pub fn ingest_upload(&mut self, file: MediaFile) -> Result<ProcessingJob, CaptureError> {
        self.require(CaptureState::is_idle, "upload a video")?;
        log::info!("Ingesting upload {} ({} bytes)", file.name, file.size_bytes());
        self.set_state(CaptureState::Processing);
        Ok(self.issue_job(file, AssetSource::Uploaded, None))
    }

    /// Apply a finished processing job.
    ///
    /// Returns `Ok(false)` when the outcome is stale (a retake, cancel or newer
    /// job superseded it) and was discarded. Upload rejections, and recordings
    /// too large or empty to ever save, return the controller to idle with the
    /// validation error; any other rejected recording falls back to the raw file.
    pub fn complete_processing(&mut self, outcome: ProcessingOutcome) -> Result<bool, CaptureError> {
        if outcome.generation != self.generation || self.state != CaptureState::Processing {
            log::debug!(
                "Discarding stale processing result (generation {}, current {}, state {})",
                outcome.generation,
                self.generation,
                self.state
            );
            return Ok(false);
        }
        self.in_flight = None;

        match outcome.result {
            Ok(processed) => {
                for degradation in &processed.degradations {
                    self.notify_error(&CaptureError::Processing(degradation.clone()));
                }
                self.present(processed.asset);
                Ok(true)
            }
            Err(Rejected { reason, raw }) => {
                let salvageable = outcome.source == AssetSource::Recorded
                    && !matches!(
                        reason,
                        ValidationError::TooLarge { .. } | ValidationError::TooLong { .. } | ValidationError::Empty
                    );
                if !salvageable {
                    return self.abort(reason.into());
                }

                // The raw take must still respect the duration ceiling.
                let duration_secs = outcome.recorded_secs.unwrap_or(0.0);
                let max_secs = self.config.validation.max_duration_secs;
                if duration_secs > max_secs {
                    return self.abort(ValidationError::TooLong { duration_secs, max_secs }.into());
                }

                log::warn!("Recorded video failed validation ({}); using the unprocessed recording", reason);
                self.notify_error(&CaptureError::Validation(reason));
                self.present(MediaAsset::new(raw, duration_secs, None, AssetSource::Recorded, false));
                Ok(true)
            }
        }
    }

    /// Stop, process inline and apply the result.
    pub fn stop_and_process(&mut self, pipeline: &MediaPipeline) -> Result<(), CaptureError> {
        let job = self.stop_recording()?;
        self.complete_processing(job.run(pipeline)).map(|_| ())
    }

    /// Ingest, process inline and apply the result.
    pub fn process_upload(&mut self, file: MediaFile, pipeline: &MediaPipeline) -> Result<(), CaptureError> {
        let job = self.ingest_upload(file)?;
        self.complete_processing(job.run(pipeline)).map(|_| ())
    }

    /// Discard the current take and record again without a countdown.
    /// Transitions: ready_for_review | processing → recording.
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        self.require(
            |s| matches!(s, CaptureState::ReadyForReview | CaptureState::Processing),
            "retake",
        )?;
        self.supersede_job();
        self.asset = None;
        self.previews.revoke_all();

        let stream_id = match self.streams.acquire(&self.config.constraints) {
            Ok(stream) => stream.id.clone(),
            Err(e) => return self.abort(e.into()),
        };
        self.previews.create(PreviewTarget::LiveStream(stream_id));
        self.begin_recording()
    }

    /// Transitions: ready_for_review → finalizing.
    pub fn accept(&mut self) -> Result<(), CaptureError> {
        self.require(|s| matches!(s, CaptureState::ReadyForReview), "accept")?;
        self.set_state(CaptureState::Finalizing);
        Ok(())
    }

    /// Persist the accepted asset. Transitions: finalizing → saved, or back to
    /// ready_for_review on any failure.
    pub fn save(
        &mut self,
        gateway: &dyn PersistenceGateway,
        owner_id: &str,
        details: &ProfileDetails,
    ) -> Result<&SavedVideo, CaptureError> {
        self.require(|s| matches!(s, CaptureState::Finalizing), "save")?;
        let Some(asset) = self.asset.as_ref() else {
            return Err(self.invalid_state("save"));
        };

        match publisher::publish(gateway, owner_id, asset, details, self.clock.utc_now()) {
            Ok(saved) => {
                log::info!("Saved intro video for {} at {}", owner_id, saved.video_url);
                self.previews.create(PreviewTarget::Asset(saved.asset.checksum.clone()));
                self.set_state(CaptureState::Saved);
                Ok(self.saved.insert(saved))
            }
            Err(e) => {
                self.set_state(CaptureState::ReadyForReview);
                self.notify_error(&e);
                Err(e)
            }
        }
    }

    /// Abandon whatever is in progress. Releases the stream, discards buffered
    /// chunks and previews, and ignores any in-flight processing result.
    pub fn cancel(&mut self) -> Result<(), CaptureError> {
        if self.state.is_saved() {
            return Err(self.invalid_state("cancel"));
        }
        if self.state.is_idle() {
            return Ok(());
        }
        log::info!("Capture cancelled while {}", self.state);
        self.teardown();
        self.set_state(CaptureState::Idle);
        Ok(())
    }

    /// Start over after a save; the next save replaces the video in place.
    /// Transitions: saved → idle.
    pub fn replace(&mut self) -> Result<(), CaptureError> {
        self.require(CaptureState::is_saved, "replace")?;
        self.saved = None;
        self.teardown();
        self.set_state(CaptureState::Idle);
        Ok(())
    }

    pub fn lock_status(&self, gateway: &dyn PersistenceGateway, owner_id: &str) -> Result<LockStatus, CaptureError> {
        retention::lock_status(gateway, owner_id, self.clock.utc_now(), self.config.lock_window_days)
    }

    /// Delete the owner's saved video, refused while the lock window is open.
    /// Allowed from idle or saved; a permitted delete from saved returns to idle.
    pub fn delete_video(
        &mut self,
        gateway: &dyn PersistenceGateway,
        owner_id: &str,
    ) -> Result<LockStatus, CaptureError> {
        self.require(|s| s.is_idle() || s.is_saved(), "delete the video")?;
        let status = match retention::delete_profile_video(
            gateway,
            owner_id,
            self.clock.utc_now(),
            self.config.lock_window_days,
        ) {
            Ok(status) => status,
            Err(e) => {
                self.notify_error(&e);
                return Err(e);
            }
        };

        if self.state.is_saved() {
            self.saved = None;
            self.teardown();
            self.set_state(CaptureState::Idle);
        }
        Ok(status)
    }

    fn begin_recording(&mut self) -> Result<(), CaptureError> {
        let mime_type = match self.streams.select_recording_format(&self.config.preferred_mime_types) {
            Ok(mime) => mime,
            Err(e) => return self.abort(e.into()),
        };

        let session = RecordingSession::new(mime_type, self.clock.instant());
        if let Err(e) = self.streams.start_recording(session.mime_type(), session.chunk_sink()) {
            return self.abort(e.into());
        }

        self.recording = Some(session);
        self.countdown_started = None;
        self.set_state(CaptureState::Recording { duration_secs: 0.0 });
        Ok(())
    }

    fn issue_job(&mut self, file: MediaFile, source: AssetSource, recorded_secs: Option<f64>) -> ProcessingJob {
        self.supersede_job();
        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        ProcessingJob {
            generation: self.generation,
            file,
            source,
            recorded_secs,
            cancel,
        }
    }

    /// Make any in-flight job stale and ask it to stop.
    fn supersede_job(&mut self) {
        self.generation += 1;
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    fn present(&mut self, asset: MediaAsset) {
        self.previews.create(PreviewTarget::Asset(asset.checksum.clone()));
        if let Some(ref delegate) = self.delegate {
            delegate.on_asset_ready(&asset);
        }
        self.asset = Some(asset);
        self.set_state(CaptureState::ReadyForReview);
    }

    fn teardown(&mut self) {
        self.supersede_job();
        if let Some(session) = self.recording.take() {
            if let Err(e) = self.streams.stop_recording() {
                log::warn!("Recorder did not stop cleanly: {}", e);
            }
            session.discard();
        }
        self.streams.release();
        self.previews.revoke_all();
        self.countdown_started = None;
        self.asset = None;
    }

    /// Tear down, return to idle and surface `error`.
    fn abort<T>(&mut self, error: CaptureError) -> Result<T, CaptureError> {
        log::error!("Capture failed while {}: {}", self.state, error);
        self.teardown();
        self.set_state(CaptureState::Idle);
        self.notify_error(&error);
        Err(error)
    }

    fn require(&self, allowed: impl Fn(&CaptureState) -> bool, action: &'static str) -> Result<(), CaptureError> {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(self.invalid_state(action))
        }
    }

    fn invalid_state(&self, action: &'static str) -> CaptureError {
        CaptureError::InvalidState {
            state: self.state.name(),
            action,
        }
    }

    fn set_state(&mut self, new_state: CaptureState) {
        if self.state.is_idle() && new_state.is_idle() {
            return;
        }
        if !self.state.can_transition_to(&new_state) {
            log::error!("Ignoring invalid transition {} -> {}", self.state, new_state);
            return;
        }
        if self.state.name() != new_state.name() {
            log::debug!("State {} -> {}", self.state, new_state);
        }
        self.state = new_state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&self.state);
        }
    }

    fn notify_countdown(&self, remaining: u32) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_countdown(remaining);
        }
    }

    fn notify_error(&self, error: &CaptureError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }
}

impl<B: CaptureBackend> Drop for CaptureController<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
