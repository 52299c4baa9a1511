use crate::approval::ApprovalInstance;
use crate::condition::{ConditionEngine, EvaluationContext};
use crate::engine::EngineConfig;
use crate::error::ResolutionError;
use crate::flow::{FlowDefinition, Stage, Status, Transition};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "token")]
pub enum Action {
    /// Directly names a destination: a target stage id, a target status or a
    /// transition label.
    Named(String),
    /// Let the transitions' conditions decide.
    Auto,
}

impl Action {
    pub fn named(token: impl Into<String>) -> Self {
        Action::Named(token.into())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Named(token) => write!(f, "{}", token),
            Action::Auto => write!(f, "<auto>"),
        }
    }
}

/// How the winning transition was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchedBy {
    Action,
    Conditions,
    Default,
}

/// A transition that is legal to commit, with everything the commit needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTransition {
    pub source_stage_id: String,
    pub transition: Transition,
    /// `None` when the approval terminates into `status`.
    pub next_stage_id: Option<String>,
    pub status: Status,
    pub matched_by: MatchedBy,
    /// The approval's iteration counter when this was resolved.
    pub base_iteration: u32,
    /// The iteration counter once committed.
    pub iteration: u32,
}

/// Picks the transition to fire for one action against one flow definition.
pub struct TransitionResolver<'a> {
    definition: &'a FlowDefinition,
    config: &'a EngineConfig,
}

impl<'a> TransitionResolver<'a> {
    pub fn new(definition: &'a FlowDefinition, config: &'a EngineConfig) -> Self {
        Self { definition, config }
    }

    /// Full resolution against a live approval: rejects closed approvals, selects
    /// a transition and enforces the destination's iteration guard.
    pub fn resolve(
        &self,
        approval: &ApprovalInstance,
        action: &Action,
        context: &EvaluationContext,
    ) -> Result<ResolvedTransition, ResolutionError> {
        if approval.status.is_terminal() {
            return Err(ResolutionError::AlreadyTerminal(approval.status.clone()));
        }
        let stage_id = approval
            .current_stage_id
            .as_deref()
            .ok_or_else(|| ResolutionError::StageNotFound("<none>".to_string()))?;

        let (stage, transition, matched_by) = self.select(stage_id, action, context)?;
        let next_stage_id = self.next_stage_id(transition)?;
        let iteration = approval.iteration.checked_add(1).ok_or_else(|| {
            ResolutionError::IterationLimitExceeded {
                stage_id: stage.id.clone(),
                visits: approval.iteration,
                limit: u32::MAX,
            }
        })?;

        if let Some(destination) = next_stage_id.as_deref() {
            self.check_iteration_guard(approval, destination)?;
        }

        Ok(ResolvedTransition {
            source_stage_id: stage.id.clone(),
            transition: transition.clone(),
            next_stage_id,
            status: transition.to.clone(),
            matched_by,
            base_iteration: approval.iteration,
            iteration,
        })
    }

    /// Selects the transition out of `stage_id` without reference to a live approval.
    pub fn select(
        &self,
        stage_id: &str,
        action: &Action,
        context: &EvaluationContext,
    ) -> Result<(&'a Stage, &'a Transition, MatchedBy), ResolutionError> {
        let stage = self
            .definition
            .stage(stage_id)
            .ok_or_else(|| ResolutionError::StageNotFound(stage_id.to_string()))?;

        let selected = match action {
            Action::Named(token) => stage
                .transitions
                .iter()
                .find(|t| t.answers_to(token, self.config.match_transition_labels))
                .map(|t| (t, MatchedBy::Action)),
            Action::Auto => self.route_by_conditions(stage, context),
        };

        match selected {
            Some((transition, matched_by)) => {
                tracing::debug!(
                    stage_id,
                    action = %action,
                    to = %transition.to,
                    ?matched_by,
                    "selected transition"
                );
                Ok((stage, transition, matched_by))
            }
            None => Err(ResolutionError::NoEligibleTransition {
                stage_id: stage_id.to_string(),
                action: action.to_string(),
            }),
        }
    }

    /// First non-default transition whose groups all pass, in declared order;
    /// otherwise the stage's default transition.
    fn route_by_conditions(
        &self,
        stage: &'a Stage,
        context: &EvaluationContext,
    ) -> Option<(&'a Transition, MatchedBy)> {
        let engine = ConditionEngine::new(context, self.config.equality);
        stage
            .transitions
            .iter()
            .filter(|t| !t.is_default)
            .find(|t| engine.evaluate_all(&t.conditions))
            .map(|t| (t, MatchedBy::Conditions))
            .or_else(|| {
                tracing::trace!(stage_id = %stage.id, "no conditioned transition matched");
                stage.default_transition().map(|t| (t, MatchedBy::Default))
            })
    }

    /// Terminal statuses leave no current stage. Otherwise the explicit target wins,
    /// falling back to the stage that carries the target status.
    fn next_stage_id(&self, transition: &Transition) -> Result<Option<String>, ResolutionError> {
        if transition.to.is_terminal() {
            return Ok(None);
        }
        if let Some(target) = &transition.target_stage_id {
            return Ok(Some(target.clone()));
        }
        self.definition
            .stage_by_status(&transition.to)
            .map(|s| Some(s.id.clone()))
            .ok_or_else(|| ResolutionError::StageNotFound(transition.to.to_string()))
    }

    fn check_iteration_guard(
        &self,
        approval: &ApprovalInstance,
        destination: &str,
    ) -> Result<(), ResolutionError> {
        let stage = self
            .definition
            .stage(destination)
            .ok_or_else(|| ResolutionError::StageNotFound(destination.to_string()))?;
        let visits = approval.visits(destination);
        if visits == 0 {
            return Ok(());
        }
        match stage.max_iterations.or(self.config.default_max_iterations) {
            Some(limit) if visits > limit => Err(ResolutionError::IterationLimitExceeded {
                stage_id: destination.to_string(),
                visits,
                limit,
            }),
            _ => Ok(()),
        }
    }
}
