//! Per-provider resolution workflow.
//!
//! `NotStarted -> MagnetAdded -> FilesSelected -> StreamReady -> Unrestricted`,
//! with `Failed` reachable from every step. Steps run strictly in order;
//! calling one out of order is a caller bug and returns `InvalidState`
//! without touching the provider.

use std::time::Duration;

use tracing::{debug, info};

use super::{select_main_file, DebridError, DebridProvider, StreamInfo};
use crate::config::DebridSettings;

/// File id used when the provider gives no file listing.
const DEFAULT_FILE_ID: &str = "0";

/// How long to wait for a provider to prepare a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_secs(2),
        }
    }
}

impl From<&DebridSettings> for PollPolicy {
    fn from(settings: &DebridSettings) -> Self {
        Self {
            attempts: settings.poll_attempts.max(1),
            interval: Duration::from_millis(settings.poll_interval_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    NotStarted,
    MagnetAdded { torrent_id: String },
    FilesSelected { torrent_id: String },
    StreamReady { stream: StreamInfo },
    Unrestricted { stream: StreamInfo },
    Failed { error: DebridError },
}

impl WorkflowState {
    fn name(&self) -> &'static str {
        match self {
            WorkflowState::NotStarted => "not_started",
            WorkflowState::MagnetAdded { .. } => "magnet_added",
            WorkflowState::FilesSelected { .. } => "files_selected",
            WorkflowState::StreamReady { .. } => "stream_ready",
            WorkflowState::Unrestricted { .. } => "unrestricted",
            WorkflowState::Failed { .. } => "failed",
        }
    }
}

/// Drives one provider through the workflow for one infohash.
pub struct StreamResolver<'a> {
    provider: &'a dyn DebridProvider,
    poll: PollPolicy,
    state: WorkflowState,
}

impl<'a> StreamResolver<'a> {
    pub fn new(provider: &'a dyn DebridProvider, poll: PollPolicy) -> Self {
        Self {
            provider,
            poll,
            state: WorkflowState::NotStarted,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Run every step and return the final stream.
    pub async fn resolve(mut self, hash: &str) -> Result<StreamInfo, DebridError> {
        self.add_magnet(hash).await?;
        self.select_files().await?;
        self.get_stream_url().await?;
        self.unrestrict().await
    }

    pub async fn add_magnet(&mut self, hash: &str) -> Result<String, DebridError> {
        if self.state != WorkflowState::NotStarted {
            return Err(self.out_of_order("add_magnet"));
        }
        let outcome = self.provider.add_magnet(hash).await;
        let torrent_id = self.record(outcome)?;
        debug!(service = %self.provider.service(), torrent_id = %torrent_id, "Magnet added");
        self.state = WorkflowState::MagnetAdded {
            torrent_id: torrent_id.clone(),
        };
        Ok(torrent_id)
    }

    /// Select the main video file. Providers without selection skip the listing.
    pub async fn select_files(&mut self) -> Result<(), DebridError> {
        let torrent_id = match &self.state {
            WorkflowState::MagnetAdded { torrent_id } => torrent_id.clone(),
            _ => return Err(self.out_of_order("select_files")),
        };

        let file_id = if self.provider.requires_file_selection() {
            let listing = self.provider.list_files(&torrent_id).await;
            let files = self.record(listing)?;
            select_main_file(&files)
                .map(|f| f.id.clone())
                .unwrap_or_else(|| DEFAULT_FILE_ID.to_string())
        } else {
            DEFAULT_FILE_ID.to_string()
        };

        let outcome = self
            .provider
            .select_files(&torrent_id, std::slice::from_ref(&file_id))
            .await;
        self.record(outcome)?;
        debug!(torrent_id = %torrent_id, file_id = %file_id, "Files selected");
        self.state = WorkflowState::FilesSelected { torrent_id };
        Ok(())
    }

    /// Query for the prepared link, polling while the provider reports `FileNotReady`.
    pub async fn get_stream_url(&mut self) -> Result<StreamInfo, DebridError> {
        let torrent_id = match &self.state {
            WorkflowState::FilesSelected { torrent_id } => torrent_id.clone(),
            _ => return Err(self.out_of_order("get_stream_url")),
        };

        let mut attempt = 1;
        let outcome = loop {
            match self.provider.get_stream_url(&torrent_id).await {
                Err(DebridError::FileNotReady) if attempt < self.poll.attempts => {
                    debug!(torrent_id = %torrent_id, attempt, "Stream not ready, polling");
                    attempt += 1;
                    tokio::time::sleep(self.poll.interval).await;
                }
                other => break other,
            }
        };

        let stream = self.record(outcome)?;
        self.state = WorkflowState::StreamReady {
            stream: stream.clone(),
        };
        Ok(stream)
    }

    pub async fn unrestrict(&mut self) -> Result<StreamInfo, DebridError> {
        let mut stream = match &self.state {
            WorkflowState::StreamReady { stream } => stream.clone(),
            _ => return Err(self.out_of_order("unrestrict")),
        };

        let outcome = self.provider.unrestrict(&stream.url).await;
        stream.url = self.record(outcome)?;
        info!(
            service = %stream.debrid_service,
            file = %stream.file_name,
            "Stream resolved"
        );
        self.state = WorkflowState::Unrestricted {
            stream: stream.clone(),
        };
        Ok(stream)
    }

    fn record<T>(&mut self, outcome: Result<T, DebridError>) -> Result<T, DebridError> {
        if let Err(e) = &outcome {
            self.state = WorkflowState::Failed { error: e.clone() };
        }
        outcome
    }

    fn out_of_order(&self, step: &str) -> DebridError {
        DebridError::InvalidState(format!("{} called in state {}", step, self.state.name()))
    }
}
