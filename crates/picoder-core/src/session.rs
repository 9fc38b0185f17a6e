//! Editing session: the single owner of mutable editing state.
//!
//! A [`Session`] holds the current settings, source, artifact and history.
//! Every change goes through it, so the rest of the crate stays pure.
//!
//! # Rendering
//!
//! Rendering is split into three steps so hosts can run renders off the
//! main thread or out of order:
//!
//! 1. [`Session::begin_render`] captures `(seq, source, settings)` by value
//! 2. [`RenderJob::run`] renders without touching the session
//! 3. [`Session::complete_render`] applies the result unless a newer one
//!    has already been displayed
//!
//! Synchronous callers use [`Session::update`], which does all three.
//!
//! # Remote edits
//!
//! At most one remote edit is in flight. [`Session::begin_remote_edit`]
//! hands out a ticket carrying the current artifact; the host performs the
//! network call and reports back through [`Session::finish_remote_edit`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::acquire::SourceFile;
use crate::decode::{image_dimensions, DecodeError, DecodeLimits};
use crate::encode::{decode_data_uri, EncodeError};
use crate::export::ExportKind;
use crate::history::{HistoryBuffer, HistoryEntry, DEFAULT_HISTORY_CAPACITY};
use crate::remote::RemoteEditError;
use crate::render::{render, OutputArtifact, RenderError, SourceRaster};
use crate::settings::{MaskShape, Settings, SettingsPatch};

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Number of history entries kept
    pub history_capacity: usize,
    /// Settings a new session starts with
    pub default_settings: Settings,
    /// Limits applied when loading sources
    pub decode_limits: DecodeLimits,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_settings: Settings::default(),
            decode_limits: DecodeLimits::default(),
        }
    }
}

/// Whether a change is recorded in history.
///
/// Continuous adjustments (slider or mask drags) are `Live` while the gesture
/// is in progress; discrete actions and gesture ends are `Commit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Live,
    #[default]
    Commit,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Remote(#[from] RemoteEditError),
}

/// A render captured from the session state at one point in time.
#[derive(Debug, Clone)]
pub struct RenderJob {
    seq: u64,
    source: Arc<SourceRaster>,
    settings: Settings,
    commit: bool,
}

impl RenderJob {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Render the captured state.
    pub fn run(self) -> RenderOutcome {
        let result = render(&self.source, &self.settings);
        RenderOutcome { job: self, result }
    }
}

/// Result of a [`RenderJob`], to be handed back to the session.
#[derive(Debug)]
pub struct RenderOutcome {
    job: RenderJob,
    result: Result<OutputArtifact, RenderError>,
}

impl RenderOutcome {
    pub fn seq(&self) -> u64 {
        self.job.seq
    }

    pub fn result(&self) -> Result<&OutputArtifact, &RenderError> {
        self.result.as_ref()
    }
}

/// Permission to run one remote edit.
#[derive(Debug, Clone)]
pub struct RemoteEditTicket {
    image_data_uri: String,
    original_size: u64,
    source: Option<Arc<SourceRaster>>,
}

impl RemoteEditTicket {
    /// The artifact to send for editing.
    pub fn image_data_uri(&self) -> &str {
        &self.image_data_uri
    }
}

/// The editing session.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    settings: Settings,
    source: Option<Arc<SourceRaster>>,
    artifact: Option<OutputArtifact>,
    /// Settings the displayed artifact was rendered from
    displayed_settings: Settings,
    history: HistoryBuffer,
    next_seq: u64,
    displayed_seq: u64,
    /// Gesture end waiting for the render with this sequence number
    pending_commit: Option<u64>,
    remote_in_flight: bool,
    remote_edits: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let settings = config.default_settings.clone().normalized();
        Self {
            displayed_settings: settings.clone(),
            settings,
            history: HistoryBuffer::new(config.history_capacity),
            config,
            source: None,
            artifact: None,
            next_seq: 0,
            displayed_seq: 0,
            pending_commit: None,
            remote_in_flight: false,
            remote_edits: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn source(&self) -> Option<&Arc<SourceRaster>> {
        self.source.as_ref()
    }

    pub fn artifact(&self) -> Option<&OutputArtifact> {
        self.artifact.as_ref()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_restoring(&self) -> bool {
        self.history.is_restoring()
    }

    /// Whether a remote edit is in flight.
    pub fn is_remote_edit_pending(&self) -> bool {
        self.remote_in_flight
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn snapshot(&self) -> HistoryEntry {
        HistoryEntry::new(
            self.artifact.clone(),
            self.displayed_settings.clone(),
            self.source.clone(),
        )
    }

    /// Mark everything in flight as stale.
    fn supersede_renders(&mut self) {
        self.displayed_seq = self.bump_seq();
        self.pending_commit = None;
    }

    /// Decode and display a new source.
    ///
    /// History is reset and the first render committed. On failure the
    /// previous source and artifact are left untouched.
    pub fn load_source(
        &mut self,
        bytes: &[u8],
        name: &str,
    ) -> Result<&OutputArtifact, SessionError> {
        let source = Arc::new(SourceRaster::decode(bytes, name, &self.config.decode_limits)?);
        let artifact = render(&source, &self.settings)?;

        log::info!(
            "session: loaded {} ({}x{}, {} bytes)",
            source.name,
            source.width(),
            source.height(),
            source.byte_size
        );

        self.supersede_renders();
        self.displayed_settings = self.settings.clone();
        self.source = Some(source);
        self.history.reset();
        self.history.commit(HistoryEntry::new(
            Some(artifact.clone()),
            self.settings.clone(),
            self.source.clone(),
        ));
        Ok(&*self.artifact.insert(artifact))
    }

    pub fn load_file(&mut self, file: &SourceFile) -> Result<&OutputArtifact, SessionError> {
        self.load_source(&file.bytes, &file.name)
    }

    /// Drop the source, artifact and history. Settings are kept.
    pub fn clear(&mut self) {
        self.supersede_renders();
        self.source = None;
        self.artifact = None;
        self.history.reset();
        log::debug!("session: cleared");
    }

    /// Merge `patch` into the settings and capture a render of the result.
    ///
    /// Returns `None` when no source is loaded.
    pub fn stage_update(&mut self, patch: &SettingsPatch, kind: ChangeKind) -> Option<RenderJob> {
        self.stage_settings(self.settings.merge(patch), kind)
    }

    fn stage_settings(&mut self, settings: Settings, kind: ChangeKind) -> Option<RenderJob> {
        // Any user edit ends a pending restore
        self.history.finish_restore();
        self.settings = settings;
        self.begin_render(kind)
    }

    /// Capture a render of the current state.
    pub fn begin_render(&mut self, kind: ChangeKind) -> Option<RenderJob> {
        let source = self.source.clone()?;
        Some(RenderJob {
            seq: self.bump_seq(),
            source,
            settings: self.settings.clone(),
            commit: kind == ChangeKind::Commit,
        })
    }

    /// Apply a finished render.
    ///
    /// Returns `Ok(None)` when the outcome is stale, i.e. something newer has
    /// already been displayed. A failed render leaves the state untouched.
    pub fn complete_render(
        &mut self,
        outcome: RenderOutcome,
    ) -> Result<Option<&OutputArtifact>, SessionError> {
        let RenderOutcome { job, result } = outcome;
        if job.seq <= self.displayed_seq {
            log::debug!(
                "session: discarding stale render {} (displayed {})",
                job.seq,
                self.displayed_seq
            );
            return Ok(None);
        }

        let artifact = result?;
        self.displayed_seq = job.seq;
        self.artifact = Some(artifact);
        self.displayed_settings = job.settings.clone();

        let gesture_end = self.pending_commit.is_some_and(|seq| job.seq >= seq);
        if gesture_end {
            self.pending_commit = None;
        }

        if job.commit || gesture_end {
            self.history.commit(HistoryEntry::new(
                self.artifact.clone(),
                job.settings,
                Some(job.source),
            ));
        }
        Ok(self.artifact.as_ref())
    }

    fn run_now(&mut self, job: Option<RenderJob>) -> Result<Option<&OutputArtifact>, SessionError> {
        match job {
            Some(job) => self.complete_render(job.run()),
            None => Ok(None),
        }
    }

    /// Merge `patch` and re-render synchronously.
    ///
    /// Returns the new artifact, or `None` when no source is loaded.
    pub fn update(
        &mut self,
        patch: &SettingsPatch,
        kind: ChangeKind,
    ) -> Result<Option<&OutputArtifact>, SessionError> {
        let job = self.stage_update(patch, kind);
        self.run_now(job)
    }

    pub fn rotate_left(&mut self) -> Result<Option<&OutputArtifact>, SessionError> {
        let job = self.stage_settings(self.settings.rotated_left(), ChangeKind::Commit);
        self.run_now(job)
    }

    pub fn rotate_right(&mut self) -> Result<Option<&OutputArtifact>, SessionError> {
        let job = self.stage_settings(self.settings.rotated_right(), ChangeKind::Commit);
        self.run_now(job)
    }

    pub fn toggle_flip_h(&mut self) -> Result<Option<&OutputArtifact>, SessionError> {
        let job = self.stage_settings(self.settings.toggle_flip_h(), ChangeKind::Commit);
        self.run_now(job)
    }

    pub fn toggle_flip_v(&mut self) -> Result<Option<&OutputArtifact>, SessionError> {
        let job = self.stage_settings(self.settings.toggle_flip_v(), ChangeKind::Commit);
        self.run_now(job)
    }

    pub fn set_mask(&mut self, mask: MaskShape) -> Result<Option<&OutputArtifact>, SessionError> {
        self.update(&SettingsPatch::mask(mask), ChangeKind::Commit)
    }

    /// End of a continuous gesture: record the current state.
    ///
    /// If the gesture's last render is still in flight, the commit is
    /// deferred until [`Session::complete_render`] applies it, so the entry
    /// pairs the settings with the image rendered from them. Returns whether
    /// an entry was recorded or scheduled.
    pub fn commit_gesture(&mut self) -> bool {
        if self.artifact.is_none() {
            return false;
        }
        self.history.finish_restore();
        if self.next_seq > self.displayed_seq {
            self.pending_commit = Some(self.next_seq);
            return true;
        }
        self.history.commit(self.snapshot())
    }

    fn restore(&mut self, entry: HistoryEntry) {
        self.supersede_renders();
        self.displayed_settings = entry.settings.clone();
        self.settings = entry.settings;
        self.source = entry.source;
        self.artifact = entry.artifact;
    }

    /// Step back in history. Returns `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        match self.history.undo().cloned() {
            Some(entry) => {
                self.restore(entry);
                true
            }
            None => false,
        }
    }

    /// Step forward in history. Returns `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        match self.history.redo().cloned() {
            Some(entry) => {
                self.restore(entry);
                true
            }
            None => false,
        }
    }

    /// Acknowledge that the host has applied a restored state.
    pub fn restore_complete(&mut self) {
        self.history.finish_restore();
    }

    /// Start a remote edit of the current artifact.
    ///
    /// Returns `None` if there is nothing to edit or an edit is already in
    /// flight.
    pub fn begin_remote_edit(&mut self) -> Option<RemoteEditTicket> {
        if self.remote_in_flight {
            return None;
        }
        let artifact = self.artifact.as_ref()?;
        let ticket = RemoteEditTicket {
            image_data_uri: artifact.data_uri.clone(),
            original_size: artifact.original_size,
            source: self.source.clone(),
        };
        self.remote_in_flight = true;
        Some(ticket)
    }

    /// Apply the outcome of a remote edit.
    ///
    /// On success the edited image replaces the artifact and is committed to
    /// history. Returns `Ok(None)` if the source changed while the edit was
    /// in flight. On failure nothing changes and the error is returned.
    pub fn finish_remote_edit(
        &mut self,
        ticket: RemoteEditTicket,
        result: Result<String, RemoteEditError>,
    ) -> Result<Option<&OutputArtifact>, SessionError> {
        self.remote_in_flight = false;

        let data_uri = result.inspect_err(|e| log::warn!("session: remote edit failed: {}", e))?;

        let same_source = match (&ticket.source, &self.source) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        if !same_source {
            log::debug!("session: discarding remote edit for a replaced source");
            return Ok(None);
        }

        let (_, bytes) = decode_data_uri(&data_uri)?;
        let (width, height) = image_dimensions(&bytes)?;

        self.remote_edits += 1;
        let name = format!("ai-edited-{}.png", self.remote_edits);
        let artifact =
            OutputArtifact::from_data_uri(data_uri, width, height, name, ticket.original_size);

        self.supersede_renders();
        self.artifact = Some(artifact);
        self.history.finish_restore();
        self.history.commit(self.snapshot());

        log::info!("session: applied remote edit ({}x{})", width, height);
        Ok(self.artifact.as_ref())
    }

    /// Export snippet for the current artifact.
    pub fn export(&self, kind: ExportKind) -> Option<String> {
        self.artifact.as_ref().map(|a| kind.snippet(a))
    }
}
