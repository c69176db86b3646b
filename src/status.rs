//! Pipeline status taxonomy.
//!
//! One value per stage of the workflow, each with a human-readable
//! message. The CLI prints transitions as the pipeline advances; nothing
//! here carries state beyond the label itself.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Idle,
    LoadingProject,
    TreeBuilt,
    PromptReady,
    AwaitingResponse,
    Parsing,
    Dispatching,
    Done,
    DoneWithErrors,
    Failed,
}

impl PipelineStatus {
    pub fn message(&self) -> &'static str {
        match self {
            PipelineStatus::Idle => "no request yet",
            PipelineStatus::LoadingProject => "reading project files...",
            PipelineStatus::TreeBuilt => "project tree built",
            PipelineStatus::PromptReady => "level 1 prompt ready",
            PipelineStatus::AwaitingResponse => "awaiting level 1 output...",
            PipelineStatus::Parsing => "parsing level 1 output...",
            PipelineStatus::Dispatching => "calling level 2 model...",
            PipelineStatus::Done => "all modifications processed",
            PipelineStatus::DoneWithErrors => "completed with errors",
            PipelineStatus::Failed => "a fatal error occurred",
        }
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
