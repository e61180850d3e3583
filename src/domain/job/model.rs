use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of a conversion job: queued → processing → finished | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Processing,
    Finished,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }

    /// States a job may be in immediately before entering `self`
    pub fn predecessors(&self) -> &'static [JobState] {
        match self {
            Self::Queued => &[],
            Self::Processing => &[Self::Queued],
            Self::Finished => &[Self::Processing],
            // queued → failed covers a run that could not even record `processing`
            Self::Failed => &[Self::Queued, Self::Processing],
        }
    }

    pub fn can_transition_to(&self, next: JobState) -> bool {
        next.predecessors().contains(self)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "finished" => Ok(Self::Finished),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown job state: {}", other)),
        }
    }
}

/// A state change requested by the job runner, with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTransition {
    Processing,
    Finished { result_ref: String },
    Failed { error: String },
}

impl JobTransition {
    pub fn target(&self) -> JobState {
        match self {
            Self::Processing => JobState::Processing,
            Self::Finished { .. } => JobState::Finished,
            Self::Failed { .. } => JobState::Failed,
        }
    }

    pub fn result_ref(&self) -> Option<&str> {
        match self {
            Self::Finished { result_ref } => Some(result_ref),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("job cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: JobState,
    pub to: JobState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub state: JobState,
    pub result_ref: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn queued(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: JobState::Queued,
            result_ref: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a transition, keeping `result_ref`/`error` consistent with the state
    pub fn apply(&mut self, transition: JobTransition) -> Result<(), InvalidTransition> {
        let next = transition.target();
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        self.state = next;
        self.result_ref = transition.result_ref().map(str::to_string);
        self.error = transition.error().map(str::to_string);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Response for GET /api/jobs/{jobId}
///
/// `queued` is reported as `processing`: callers only distinguish
/// in-progress from terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatusResponse {
    Processing,
    Finished { result_ref: String },
    Failed { error: String },
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        match job.state {
            JobState::Queued | JobState::Processing => Self::Processing,
            JobState::Finished => Self::Finished {
                result_ref: job.result_ref.unwrap_or_default(),
            },
            JobState::Failed => Self::Failed {
                error: job.error.unwrap_or_default(),
            },
        }
    }
}

/// Response for POST /api/jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    pub job_id: Uuid,
}
