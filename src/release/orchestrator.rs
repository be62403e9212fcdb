//! Release state machine.
//!
//! A release moves through `Idle → Verifying → Assembling →
//! PublishingMetadata → Done`. Any failure stops it in `Failed`; completed
//! steps are not rolled back.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::build::{
    Artifact, AssembleError, Assembler, BuildConfig, BuildContext, ProvenanceHeader, Toolchain,
};
use crate::release::{CommandError, Verifier, VersionControl};
use crate::version::{ReleaseType, VersionBump, VersionError, VersionRecord};

/// Phase of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleasePhase {
    Idle,
    Verifying,
    Assembling,
    PublishingMetadata,
    Done,
    Failed,
}

impl fmt::Display for ReleasePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleasePhase::Idle => "idle",
            ReleasePhase::Verifying => "verifying",
            ReleasePhase::Assembling => "assembling",
            ReleasePhase::PublishingMetadata => "publishing metadata",
            ReleasePhase::Done => "done",
            ReleasePhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Current state, carrying what earlier phases produced.
#[derive(Debug, Clone)]
pub enum ReleaseState {
    Idle,
    Verifying { bump: VersionBump },
    Assembling { bump: VersionBump },
    PublishingMetadata { bump: VersionBump, artifact: Artifact },
    Done { bump: VersionBump, artifact: Artifact },
    Failed { phase: ReleasePhase, error: String },
}

impl ReleaseState {
    pub fn phase(&self) -> ReleasePhase {
        match self {
            ReleaseState::Idle => ReleasePhase::Idle,
            ReleaseState::Verifying { .. } => ReleasePhase::Verifying,
            ReleaseState::Assembling { .. } => ReleasePhase::Assembling,
            ReleaseState::PublishingMetadata { .. } => ReleasePhase::PublishingMetadata,
            ReleaseState::Done { .. } => ReleasePhase::Done,
            ReleaseState::Failed { .. } => ReleasePhase::Failed,
        }
    }

    /// `Done` and `Failed` accept no further steps.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReleaseState::Done { .. } | ReleaseState::Failed { .. })
    }

    fn bump(&self) -> Option<&VersionBump> {
        match self {
            ReleaseState::Verifying { bump }
            | ReleaseState::Assembling { bump }
            | ReleaseState::PublishingMetadata { bump, .. }
            | ReleaseState::Done { bump, .. } => Some(bump),
            ReleaseState::Idle | ReleaseState::Failed { .. } => None,
        }
    }
}

/// Error raised while advancing a release.
#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("version record: {0}")]
    VersionRecord(#[from] VersionError),
    #[error("verification failed: {0}")]
    VerificationFailed(#[source] CommandError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error("version control failed: {0}")]
    VersionControlFailed(#[source] CommandError),
    #[error("release already finished")]
    Finished,
}

/// A release error tagged with the phase it happened in.
#[derive(Debug, Error)]
#[error("release failed while {phase}: {error}")]
pub struct PhaseError {
    pub phase: ReleasePhase,
    #[source]
    pub error: ReleaseError,
}

/// Outcome of a release run.
#[derive(Debug, Clone)]
pub struct ReleaseReport {
    pub bump: VersionBump,
    /// Tag created (or, for a dry run, that would be created)
    pub tag: String,
    /// Release artifact path
    pub path: PathBuf,
    /// Artifact written; `None` for a dry run
    pub artifact: Option<Artifact>,
    /// Phases entered, in order, starting with `Idle`
    pub phases: Vec<ReleasePhase>,
    pub dry_run: bool,
}

impl ReleaseReport {
    /// Format a summary of the release.
    pub fn summary(&self) -> String {
        if self.dry_run {
            format!(
                "Would release {} as {} and tag {}",
                self.bump,
                self.path.display(),
                self.tag
            )
        } else {
            format!("Released {} ({}), tagged {}", self.bump.next, self.path.display(), self.tag)
        }
    }
}

/// External systems a release drives.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub verifier: &'a dyn Verifier,
    pub vcs: &'a dyn VersionControl,
    pub record: &'a dyn VersionRecord,
    pub toolchain: &'a dyn Toolchain,
}

/// Drives one release through its phases.
pub struct ReleaseOrchestrator<'a> {
    context: &'a BuildContext,
    release_type: ReleaseType,
    build: BuildConfig,
    collaborators: Collaborators<'a>,
    dry_run: bool,
    state: ReleaseState,
    phases: Vec<ReleasePhase>,
}

impl<'a> ReleaseOrchestrator<'a> {
    pub fn new(
        context: &'a BuildContext,
        release_type: ReleaseType,
        collaborators: Collaborators<'a>,
    ) -> Self {
        Self {
            context,
            release_type,
            build: BuildConfig::new(),
            collaborators,
            dry_run: false,
            state: ReleaseState::Idle,
            phases: vec![ReleasePhase::Idle],
        }
    }

    /// Base build flags; the release derives its own configuration from them.
    pub fn with_build_config(mut self, build: BuildConfig) -> Self {
        self.build = build;
        self
    }

    /// Compute the bump and stop before invoking any collaborator.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn state(&self) -> &ReleaseState {
        &self.state
    }

    /// Perform one transition and return the phase entered.
    pub fn step(&mut self) -> Result<ReleasePhase, PhaseError> {
        let phase = self.state.phase();
        if self.state.is_terminal() {
            return Err(PhaseError { phase, error: ReleaseError::Finished });
        }

        let state = std::mem::replace(&mut self.state, ReleaseState::Idle);
        match self.advance(state) {
            Ok(next) => {
                self.state = next;
                let entered = self.state.phase();
                self.phases.push(entered);
                tracing::info!(from = %phase, to = %entered, "release step");
                Ok(entered)
            }
            Err(error) => {
                tracing::error!(%phase, %error, "release step failed");
                self.state = ReleaseState::Failed { phase, error: error.to_string() };
                self.phases.push(ReleasePhase::Failed);
                Err(PhaseError { phase, error })
            }
        }
    }

    /// Step until the release is done (or, for a dry run, until the bump is
    /// known).
    pub fn run(&mut self) -> Result<ReleaseReport, PhaseError> {
        loop {
            match &self.state {
                ReleaseState::Done { .. } => break,
                ReleaseState::Verifying { .. } if self.dry_run => break,
                _ => {
                    self.step()?;
                }
            }
        }

        let Some(bump) = self.state.bump().cloned() else {
            return Err(PhaseError { phase: self.state.phase(), error: ReleaseError::Finished });
        };
        let artifact = match &self.state {
            ReleaseState::Done { artifact, .. } => Some(artifact.clone()),
            _ => None,
        };
        let path = match &artifact {
            Some(artifact) => artifact.path.clone(),
            None => self.assembler().destination(&self.release_config(&bump)).0,
        };

        Ok(ReleaseReport {
            tag: self.context.config().release.tag_for(&bump.next.to_string()),
            bump,
            path,
            artifact,
            phases: self.phases.clone(),
            dry_run: self.dry_run,
        })
    }

    fn assembler(&self) -> Assembler<'a> {
        Assembler::new(self.context, self.collaborators.toolchain)
    }

    fn release_config(&self, bump: &VersionBump) -> BuildConfig {
        self.build.for_release(&bump.next.to_string())
    }

    fn advance(&self, state: ReleaseState) -> Result<ReleaseState, ReleaseError> {
        match state {
            ReleaseState::Idle => {
                let current = self.collaborators.record.read()?;
                let bump = VersionBump::new(current, self.release_type);
                tracing::info!(%bump, release_type = %self.release_type, "computed version bump");
                Ok(ReleaseState::Verifying { bump })
            }
            ReleaseState::Verifying { bump } => {
                self.collaborators.verifier.verify().map_err(ReleaseError::VerificationFailed)?;
                Ok(ReleaseState::Assembling { bump })
            }
            ReleaseState::Assembling { bump } => {
                let artifact = self.assembler().pack(&self.release_config(&bump))?;
                Ok(ReleaseState::PublishingMetadata { bump, artifact })
            }
            ReleaseState::PublishingMetadata { bump, artifact } => {
                self.publish(&bump, &artifact)?;
                Ok(ReleaseState::Done { bump, artifact })
            }
            ReleaseState::Done { .. } | ReleaseState::Failed { .. } => Err(ReleaseError::Finished),
        }
    }

    /// Persist the version, stamp the artifact, then commit and tag.
    fn publish(&self, bump: &VersionBump, artifact: &Artifact) -> Result<(), ReleaseError> {
        let version = bump.next.to_string();
        let record = self.collaborators.record;
        record.write(&bump.next)?;

        let project = &self.context.config().project;
        let header = ProvenanceHeader::new(project.name.as_str(), version.as_str())
            .with_homepage(project.homepage.clone());
        self.assembler().prepend_header(&artifact.path, &header)?;

        let release = &self.context.config().release;
        let message = release.message_for(&version);
        let vcs = self.collaborators.vcs;
        vcs.add(&[record.location().to_path_buf(), artifact.path.clone()])
            .map_err(ReleaseError::VersionControlFailed)?;
        vcs.commit(&message).map_err(ReleaseError::VersionControlFailed)?;
        vcs.tag(&release.tag_for(&version), &message).map_err(ReleaseError::VersionControlFailed)?;
        Ok(())
    }
}
