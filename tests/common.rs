//! Common test utilities for building flow definitions, approvals and contexts.
use serde_json::json;
use shonin::prelude::*;

/// The scenario flow from the docs, written as a hand-authored JSON document.
#[allow(dead_code)]
pub const TWO_STAGE_FLOW_JSON: &str = r#"{
    "id": "two-stage",
    "name": "Two stage flow",
    "version": "1.0.0",
    "stages": [
        {
            "id": "start",
            "name": "Start",
            "description": "Initial review",
            "status": "in_process",
            "transitions": [{ "to": "approved", "isDefault": true }]
        },
        {
            "id": "done",
            "name": "Done",
            "description": "Approved",
            "status": "approved",
            "transitions": []
        }
    ]
}"#;

/// Purchase approval.
///
/// `review` escalates to `director` when `amount > 10000`, otherwise approves by
/// default. The director can approve, reject, or return the request to review.
#[allow(dead_code)]
pub fn purchase_flow() -> FlowDefinition {
    FlowDefinition::new(
        "purchase",
        "Purchase approval",
        vec![
            Stage::new("review", "Manager review", Status::InProcess)
                .with_actor(Actor::Role("manager".to_string()))
                .with_transition(
                    Transition::to("escalated")
                        .with_target_stage("director")
                        .with_label("escalate")
                        .with_condition(
                            Condition::new("amount", Operator::GreaterThan, 10000).into(),
                        ),
                )
                .with_transition(Transition::to(Status::Approved).as_default()),
            Stage::new("director", "Director review", "escalated")
                .with_actor(Actor::Role("director".to_string()))
                .with_transition(Transition::to(Status::Approved).with_label("approve"))
                .with_transition(Transition::to(Status::Reject).with_label("reject"))
                .with_transition(
                    Transition::to(Status::InProcess)
                        .with_target_stage("review")
                        .with_label("return"),
                ),
            Stage::new("done", "Approved", Status::Approved),
            Stage::new("rejected", "Rejected", Status::Reject),
        ],
    )
}

/// A draft/review loop: the reviewer can send the request back to `draft`.
///
/// `draft_limit` becomes the draft stage's `maxIterations`.
#[allow(dead_code)]
pub fn review_loop_flow(draft_limit: Option<u32>) -> FlowDefinition {
    let mut draft = Stage::new("draft", "Draft", Status::InProcess).with_transition(
        Transition::to("under_review")
            .with_target_stage("review")
            .with_label("submit"),
    );
    draft.max_iterations = draft_limit;

    FlowDefinition::new(
        "loop",
        "Review loop",
        vec![
            draft,
            Stage::new("review", "Review", "under_review")
                .with_transition(
                    Transition::to(Status::InProcess)
                        .with_target_stage("draft")
                        .with_label("return"),
                )
                .with_transition(Transition::to(Status::Approved).with_label("approve")),
            Stage::new("done", "Done", Status::Approved),
        ],
    )
}

/// `amount > 10000` wrapped in `depth` alternating AND/OR groups.
#[allow(dead_code)]
pub fn nested_condition(depth: usize) -> ConditionNode {
    let mut node = ConditionNode::from(Condition::new("amount", Operator::GreaterThan, 10000));
    for level in 0..depth {
        node = if level % 2 == 0 {
            ConditionNode::and(vec![node])
        } else {
            ConditionNode::or(vec![node])
        };
    }
    node
}

/// A flow whose entry stage approves only through a `depth`-deep condition tree.
#[allow(dead_code)]
pub fn nested_condition_flow(depth: usize) -> FlowDefinition {
    FlowDefinition::new(
        "nested",
        "Nested conditions",
        vec![
            Stage::new("start", "Start", Status::InProcess)
                .with_transition(
                    Transition::to(Status::Approved).with_condition(nested_condition(depth)),
                )
                .with_transition(Transition::to(Status::Reject).as_default()),
            Stage::new("done", "Done", Status::Approved),
            Stage::new("rejected", "Rejected", Status::Reject),
        ],
    )
}

/// `{ amount: 15000, riskLevel: "high" }` as the resource.
#[allow(dead_code)]
pub fn high_value_context() -> EvaluationContext {
    EvaluationContext::new(json!({ "amount": 15000, "riskLevel": "high" }))
}

#[allow(dead_code)]
pub fn low_value_context() -> EvaluationContext {
    EvaluationContext::new(json!({ "amount": 500, "riskLevel": "low" }))
}

/// Starts `req-1` in the entry stage of `definition`.
#[allow(dead_code)]
pub fn start_approval(definition: &FlowDefinition) -> ApprovalInstance {
    ApprovalInstance::new("req-1", definition).expect("Failed to start approval")
}

/// Resolves `action` and commits it, panicking on any error.
#[allow(dead_code)]
pub fn advance(
    engine: &FlowEngine,
    definition: &FlowDefinition,
    approval: &ApprovalInstance,
    action: &Action,
    context: &EvaluationContext,
) -> ApprovalInstance {
    let resolved = engine
        .resolve(definition, approval, action, context)
        .expect("Failed to resolve transition");
    engine
        .apply_transition(approval, &resolved, "tester", None)
        .expect("Failed to commit transition")
}
