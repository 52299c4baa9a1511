use crate::flow::Status;
use itertools::Itertools;
use thiserror::Error;

/// A single structural problem found in a flow definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("Flow definition must contain at least one stage")]
    NoStages,

    #[error("Stage at position {stage_index} is missing a non-empty '{field}'")]
    MissingField {
        stage_index: usize,
        field: &'static str,
    },

    #[error("Stage id '{0}' is used by more than one stage")]
    DuplicateStageId(String),

    #[error("Status '{0}' is used by more than one stage")]
    DuplicateStatus(String),

    #[error("Transition from stage '{stage_id}' targets status '{status}', which no stage carries")]
    DanglingTargetStatus { stage_id: String, status: String },

    #[error(
        "Transition from stage '{stage_id}' targets stage '{target_stage_id}', which does not exist"
    )]
    DanglingTargetStage {
        stage_id: String,
        target_stage_id: String,
    },

    #[error("Stage '{0}' declares more than one default transition")]
    MultipleDefaults(String),

    #[error("Transition from stage '{0}' contains an empty condition group")]
    EmptyConditionGroup(String),

    #[error("Version '{0}' is not a valid 'major.minor.patch' string")]
    InvalidVersion(String),
}

/// A malformed flow definition, carrying every issue found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid flow definition: {}", .issues.iter().join("; "))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

/// Errors raised while choosing which transition fires.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Cannot modify approval in final state '{0}'")]
    AlreadyTerminal(Status),

    #[error("Stage '{0}' not found in the bound flow definition")]
    StageNotFound(String),

    #[error("No eligible transition from stage '{stage_id}' for action '{action}'")]
    NoEligibleTransition { stage_id: String, action: String },

    #[error(
        "Re-entering stage '{stage_id}' would be revisit {visits}, exceeding its limit of {limit}"
    )]
    IterationLimitExceeded {
        stage_id: String,
        visits: u32,
        limit: u32,
    },
}

/// Errors raised while committing a resolved transition onto an approval.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    #[error("Cannot modify approval in final state '{0}'")]
    AlreadyTerminal(Status),

    #[error(
        "Approval changed since the transition was resolved (expected iteration {expected} at stage {expected_stage:?}, found iteration {found} at stage {found_stage:?})"
    )]
    StaleResolution {
        expected: u32,
        found: u32,
        expected_stage: Option<String>,
        found_stage: Option<String>,
    },
}

/// Errors raised while publishing or restoring flow versions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Flow version '{0}' not found")]
    VersionNotFound(String),

    #[error("Version '{0}' is not a valid 'major.minor.patch' string")]
    InvalidVersion(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Errors that occur when decoding definitions, conditions or contexts at the boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionParseError {
    #[error("Failed to parse JSON: {0}")]
    Json(String),
}

/// Errors raised when creating an approval instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("Flow definition '{0}' has no stages to start an approval in")]
    EmptyFlow(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Commit(#[from] CommitError),
}

/// Umbrella error for hosts that want a single error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Parse(#[from] DefinitionParseError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),
}
