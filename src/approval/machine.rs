use super::{ApprovalInstance, HistoryRecord};
use crate::condition::EvaluationContext;
use crate::engine::EngineConfig;
use crate::error::{ApprovalError, CommitError};
use crate::flow::FlowDefinition;
use crate::resolver::{Action, ResolvedTransition, TransitionResolver};
use chrono::{DateTime, Utc};

impl ApprovalInstance {
    /// Commits `resolved` and returns the updated instance; `self` is left untouched.
    ///
    /// Fails if the approval is already closed, or if it moved on since `resolved`
    /// was computed. A duplicate delivery of the same action therefore never
    /// applies twice.
    pub fn apply_transition(
        &self,
        resolved: &ResolvedTransition,
        actor: &str,
        comment: Option<&str>,
    ) -> Result<ApprovalInstance, CommitError> {
        self.apply_transition_at(resolved, actor, comment, Utc::now())
    }

    pub fn apply_transition_at(
        &self,
        resolved: &ResolvedTransition,
        actor: &str,
        comment: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<ApprovalInstance, CommitError> {
        if self.is_terminal() {
            return Err(CommitError::AlreadyTerminal(self.status.clone()));
        }
        if resolved.base_iteration != self.iteration
            || self.current_stage_id.as_deref() != Some(resolved.source_stage_id.as_str())
        {
            return Err(CommitError::StaleResolution {
                expected: resolved.base_iteration,
                found: self.iteration,
                expected_stage: Some(resolved.source_stage_id.clone()),
                found_stage: self.current_stage_id.clone(),
            });
        }

        let terminal = resolved.status.is_terminal();
        let mut next = self.clone();
        next.status = resolved.status.clone();
        next.current_stage_id = if terminal {
            None
        } else {
            resolved.next_stage_id.clone()
        };
        next.iteration = resolved.iteration;
        next.history.push(HistoryRecord {
            stage_id: resolved.source_stage_id.clone(),
            next_stage_id: next.current_stage_id.clone(),
            actor: actor.to_string(),
            decision: resolved
                .transition
                .label
                .clone()
                .unwrap_or_else(|| resolved.status.to_string()),
            status: resolved.status.clone(),
            comment: comment.map(str::to_string),
            timestamp: at,
        });
        if terminal {
            next.completed_at = Some(at);
        }

        tracing::debug!(
            approval_id = %self.id,
            from = %resolved.source_stage_id,
            status = %next.status,
            iteration = next.iteration,
            "committed transition"
        );
        Ok(next)
    }

    /// Resolves `action` against `definition` and commits it in place.
    ///
    /// On error the instance is unchanged.
    pub fn apply_action(
        &mut self,
        definition: &FlowDefinition,
        config: &EngineConfig,
        action: &Action,
        context: &EvaluationContext,
        actor: &str,
        comment: Option<&str>,
    ) -> Result<ResolvedTransition, ApprovalError> {
        let resolved = TransitionResolver::new(definition, config).resolve(self, action, context)?;
        *self = self.apply_transition(&resolved, actor, comment)?;
        Ok(resolved)
    }
}
