use crate::approval::ApprovalInstance;
use crate::condition::{
    ConditionEngine, ConditionNode, ConditionReport, EqualityMode, EvaluationContext,
};
use crate::error::{ApprovalError, CommitError, DefinitionParseError, ResolutionError};
use crate::flow::{FlowDefinition, Transition};
use crate::path::{PathEvaluation, evaluate_path};
use crate::resolver::{Action, ResolvedTransition, TransitionResolver};
use crate::validator::{self, ValidationReport};
use serde::{Deserialize, Serialize};

/// Tunables shared by every operation of a [`FlowEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub equality: EqualityMode,
    /// Re-entry limit for stages that do not declare `maxIterations`.
    pub default_max_iterations: Option<u32>,
    /// Whether a named action may match a transition's label as well as its target.
    pub match_transition_labels: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            equality: EqualityMode::Loose,
            default_max_iterations: None,
            match_transition_labels: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, DefinitionParseError> {
        serde_json::from_str(json).map_err(|e| DefinitionParseError::Json(e.to_string()))
    }
}

pub struct FlowEngineBuilder {
    config: EngineConfig,
}

impl FlowEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn equality(mut self, mode: EqualityMode) -> Self {
        self.config.equality = mode;
        self
    }

    pub fn default_max_iterations(mut self, limit: u32) -> Self {
        self.config.default_max_iterations = Some(limit);
        self
    }

    pub fn match_transition_labels(mut self, enabled: bool) -> Self {
        self.config.match_transition_labels = enabled;
        self
    }

    pub fn build(self) -> FlowEngine {
        FlowEngine {
            config: self.config,
        }
    }
}

impl Default for FlowEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The host-facing surface of the approval flow engine.
///
/// Every operation is a pure function of its inputs and the engine's
/// configuration; a `FlowEngine` can be shared freely across threads.
#[derive(Debug, Clone, Default)]
pub struct FlowEngine {
    config: EngineConfig,
}

impl FlowEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> FlowEngineBuilder {
        FlowEngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn validate_flow_definition(&self, definition: &FlowDefinition) -> bool {
        validator::validate(definition)
    }

    pub fn inspect_flow_definition(&self, definition: &FlowDefinition) -> ValidationReport {
        validator::inspect(definition)
    }

    pub fn evaluate_flow_path<S: AsRef<str>>(
        &self,
        definition: &FlowDefinition,
        statuses: &[S],
    ) -> PathEvaluation {
        evaluate_path(definition, statuses)
    }

    pub fn evaluate_conditions(&self, node: &ConditionNode, context: &EvaluationContext) -> bool {
        ConditionEngine::new(context, self.config.equality).evaluate(node)
    }

    pub fn evaluate_conditions_with_details(
        &self,
        node: &ConditionNode,
        context: &EvaluationContext,
    ) -> ConditionReport {
        ConditionEngine::new(context, self.config.equality).evaluate_with_details(node)
    }

    /// Picks the transition out of `current_stage_id` for `action`, without
    /// consulting any approval state.
    ///
    /// Use [`FlowEngine::resolve`] for a live approval: only it rejects closed
    /// approvals with [`ResolutionError::AlreadyTerminal`] and applies the
    /// iteration guard.
    pub fn resolve_transition(
        &self,
        definition: &FlowDefinition,
        current_stage_id: &str,
        action: &Action,
        context: &EvaluationContext,
    ) -> Result<Transition, ResolutionError> {
        TransitionResolver::new(definition, &self.config)
            .select(current_stage_id, action, context)
            .map(|(_, transition, _)| transition.clone())
    }

    /// Resolves `action` for a live approval, including the terminal-state check
    /// and the destination's iteration guard.
    pub fn resolve(
        &self,
        definition: &FlowDefinition,
        approval: &ApprovalInstance,
        action: &Action,
        context: &EvaluationContext,
    ) -> Result<ResolvedTransition, ResolutionError> {
        TransitionResolver::new(definition, &self.config).resolve(approval, action, context)
    }

    pub fn apply_transition(
        &self,
        approval: &ApprovalInstance,
        resolved: &ResolvedTransition,
        actor: &str,
        comment: Option<&str>,
    ) -> Result<ApprovalInstance, CommitError> {
        approval.apply_transition(resolved, actor, comment)
    }

    pub fn apply_action(
        &self,
        approval: &mut ApprovalInstance,
        definition: &FlowDefinition,
        action: &Action,
        context: &EvaluationContext,
        actor: &str,
        comment: Option<&str>,
    ) -> Result<ResolvedTransition, ApprovalError> {
        approval.apply_action(definition, &self.config, action, context, actor, comment)
    }
}
