//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from the shonin crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use shonin::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let definition = FlowDefinition::from_json(&std::fs::read_to_string("path/to/flow.json")?)?;
//!
//! let engine = FlowEngine::new();
//! let report = engine.inspect_flow_definition(&definition);
//! for issue in &report.issues {
//!     println!("Issue: {}", issue);
//! }
//!
//! let path = engine.evaluate_flow_path(&definition, &["in_process", "approved"]);
//! println!("Path valid: {}", path.is_valid);
//! # Ok(())
//! # }
//! ```

// Engine surface
pub use crate::engine::{EngineConfig, FlowEngine, FlowEngineBuilder};
pub use crate::path::PathEvaluation;
pub use crate::resolver::{Action, MatchedBy, ResolvedTransition};
pub use crate::validator::ValidationReport;

// Data model
pub use crate::approval::{ApprovalInstance, HistoryRecord};
pub use crate::flow::{
    Actor, FlowDefinition, FlowVersion, SemVer, Stage, Status, Transition, VersionedFlow,
};

// Conditions
pub use crate::condition::{
    Condition, ConditionDetail, ConditionGroup, ConditionNode, ConditionReport, EqualityMode,
    EvaluationContext, LogicalOperator, Operator, PredicateOutcome, WorkflowMeta,
};

// Error types
pub use crate::error::{
    ApprovalError, CommitError, DefinitionParseError, FlowError, ResolutionError, ValidationError,
    ValidationIssue, VersionError,
};

// Trace formatting
pub use crate::trace::TraceFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
