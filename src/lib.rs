//! # Shonin - Approval Flow Engine
//!
//! **Shonin** drives multi-stage approval requests whose routing is described by a
//! declarative, versioned graph of stages and conditional transitions instead of
//! hard-coded control flow. The engine is pure: it consumes plain data, returns plain
//! data and typed errors, and never performs I/O.
//!
//! ## Core Workflow
//!
//! 1.  **Define a flow**: Build a `FlowDefinition` in code or load it from JSON with
//!     `FlowDefinition::from_json`.
//! 2.  **Validate and publish**: `VersionedFlow::create` checks the definition's structure
//!     and records it as the active version.
//! 3.  **Start an approval**: `ApprovalInstance::start` binds a new request to the active
//!     version, in the flow's first stage.
//! 4.  **Act**: `FlowEngine::resolve` picks the transition for an action (by name, or by
//!     evaluating conditions against an `EvaluationContext`), and
//!     `ApprovalInstance::apply_transition` commits it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shonin::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let definition = FlowDefinition::new(
//!         "purchase",
//!         "Purchase approval",
//!         vec![
//!             Stage::new("review", "Manager review", Status::InProcess)
//!                 .with_transition(
//!                     Transition::to("escalated").with_condition(
//!                         Condition::new("amount", Operator::GreaterThan, 10000).into(),
//!                     ),
//!                 )
//!                 .with_transition(Transition::to(Status::Approved).as_default()),
//!             Stage::new("director", "Director review", "escalated")
//!                 .with_transition(Transition::to(Status::Approved).with_label("approve"))
//!                 .with_transition(Transition::to(Status::Reject).with_label("reject")),
//!             Stage::new("done", "Approved", Status::Approved),
//!             Stage::new("rejected", "Rejected", Status::Reject),
//!         ],
//!     );
//!
//!     let flow = VersionedFlow::create(definition)?;
//!     let engine = FlowEngine::builder().default_max_iterations(3).build();
//!
//!     let mut approval = ApprovalInstance::start("req-1", &flow)?;
//!     let context = EvaluationContext::for_approval(&approval, json!({ "amount": 15000 }));
//!
//!     let resolved = engine.resolve(&flow.definition, &approval, &Action::Auto, &context)?;
//!     approval = engine.apply_transition(&approval, &resolved, "alice", None)?;
//!     println!("-> Now at stage {:?} ({})", approval.current_stage_id, approval.status);
//!
//!     let context = EvaluationContext::for_approval(&approval, json!({ "amount": 15000 }));
//!     engine.apply_action(
//!         &mut approval,
//!         &flow.definition,
//!         &Action::named("approve"),
//!         &context,
//!         "bob",
//!         Some("Within budget"),
//!     )?;
//!     assert_eq!(approval.status, Status::Approved);
//!     Ok(())
//! }
//! ```

pub mod approval;
pub mod condition;
pub mod engine;
pub mod error;
pub mod flow;
pub mod path;
pub mod prelude;
pub mod resolver;
pub mod trace;
pub mod validator;
