//! Tests for transition resolution and the iteration guard.
mod common;
use common::*;
use serde_json::json;
use shonin::prelude::*;

fn approval_at(definition: &FlowDefinition, stage_id: &str) -> ApprovalInstance {
    let mut approval = start_approval(definition);
    approval.current_stage_id = Some(stage_id.to_string());
    approval
}

#[cfg(test)]
mod resolver_tests {
    use super::*;

    #[test]
    fn test_auto_routes_by_conditions() {
        let engine = FlowEngine::new();
        let definition = purchase_flow();
        let approval = start_approval(&definition);

        let resolved = engine
            .resolve(&definition, &approval, &Action::Auto, &high_value_context())
            .expect("Failed to resolve");
        assert_eq!(resolved.matched_by, MatchedBy::Conditions);
        assert_eq!(resolved.status, Status::Custom("escalated".to_string()));
        assert_eq!(resolved.next_stage_id.as_deref(), Some("director"));
        assert_eq!(resolved.source_stage_id, "review");
        assert_eq!(resolved.base_iteration, 0);
        assert_eq!(resolved.iteration, 1);
    }

    #[test]
    fn test_auto_falls_back_to_default() {
        let engine = FlowEngine::new();
        let definition = purchase_flow();
        let approval = start_approval(&definition);

        let resolved = engine
            .resolve(&definition, &approval, &Action::Auto, &low_value_context())
            .expect("Failed to resolve");
        assert_eq!(resolved.matched_by, MatchedBy::Default);
        assert_eq!(resolved.status, Status::Approved);
        assert_eq!(resolved.next_stage_id, None, "terminal transitions leave no stage");
    }

    #[test]
    fn test_unconditioned_transition_wins_over_default() {
        let engine = FlowEngine::new();
        let definition = FlowDefinition::new(
            "simple",
            "Simple",
            vec![
                Stage::new("start", "Start", Status::InProcess)
                    .with_transition(Transition::to(Status::Reject).as_default())
                    .with_transition(Transition::to(Status::Approved)),
                Stage::new("ok", "Ok", Status::Approved),
                Stage::new("no", "No", Status::Reject),
            ],
        );

        let transition = engine
            .resolve_transition(&definition, "start", &Action::Auto, &EvaluationContext::default())
            .expect("Failed to resolve");
        assert_eq!(transition.to, Status::Approved);
    }

    #[test]
    fn test_first_matching_transition_in_declared_order() {
        let engine = FlowEngine::new();
        let definition = FlowDefinition::new(
            "tiers",
            "Tiers",
            vec![
                Stage::new("start", "Start", Status::InProcess)
                    .with_transition(Transition::to("large").with_condition(
                        Condition::new("amount", Operator::GreaterThan, 1000).into(),
                    ))
                    .with_transition(Transition::to("huge").with_condition(
                        Condition::new("amount", Operator::GreaterThan, 10000).into(),
                    )),
                Stage::new("large", "Large", "large"),
                Stage::new("huge", "Huge", "huge"),
            ],
        );

        let transition = engine
            .resolve_transition(&definition, "start", &Action::Auto, &high_value_context())
            .expect("Failed to resolve");
        assert_eq!(transition.to.as_str(), "large");
    }

    #[test]
    fn test_every_condition_group_must_pass() {
        let engine = FlowEngine::new();
        let definition = FlowDefinition::new(
            "groups",
            "Groups",
            vec![
                Stage::new("start", "Start", Status::InProcess)
                    .with_transition(
                        Transition::to(Status::Approved)
                            .with_condition(
                                Condition::new("amount", Operator::GreaterThan, 10000).into(),
                            )
                            .with_condition(
                                Condition::new("riskLevel", Operator::Equal, "low").into(),
                            ),
                    )
                    .with_transition(Transition::to(Status::Reject).as_default()),
                Stage::new("ok", "Ok", Status::Approved),
                Stage::new("no", "No", Status::Reject),
            ],
        );

        let transition = engine
            .resolve_transition(&definition, "start", &Action::Auto, &high_value_context())
            .expect("Failed to resolve");
        assert_eq!(transition.to, Status::Reject);
    }

    #[test]
    fn test_named_action_matches_label_status_or_stage() {
        let engine = FlowEngine::new();
        let definition = purchase_flow();
        let approval = approval_at(&definition, "director");
        let context = high_value_context();

        let by_label = engine
            .resolve(&definition, &approval, &Action::named("reject"), &context)
            .expect("Failed to resolve by label");
        assert_eq!(by_label.status, Status::Reject);
        assert_eq!(by_label.matched_by, MatchedBy::Action);

        let by_status = engine
            .resolve(&definition, &approval, &Action::named("approved"), &context)
            .expect("Failed to resolve by status");
        assert_eq!(by_status.status, Status::Approved);

        let by_stage = engine
            .resolve(&definition, &approval, &Action::named("review"), &context)
            .expect("Failed to resolve by stage id");
        assert_eq!(by_stage.next_stage_id.as_deref(), Some("review"));
        assert_eq!(by_stage.status, Status::InProcess);
    }

    #[test]
    fn test_named_action_ignores_conditions() {
        let engine = FlowEngine::new();
        let definition = purchase_flow();
        let approval = start_approval(&definition);

        // `escalate` is conditioned on amount > 10000, but naming it directly skips routing.
        let resolved = engine
            .resolve(&definition, &approval, &Action::named("escalate"), &low_value_context())
            .expect("Failed to resolve");
        assert_eq!(resolved.next_stage_id.as_deref(), Some("director"));
    }

    #[test]
    fn test_label_matching_can_be_disabled() {
        let engine = FlowEngine::builder().match_transition_labels(false).build();
        let definition = purchase_flow();

        let error = engine
            .resolve_transition(
                &definition,
                "director",
                &Action::named("approve"),
                &high_value_context(),
            )
            .expect_err("Labels should not match");
        assert_eq!(
            error,
            ResolutionError::NoEligibleTransition {
                stage_id: "director".to_string(),
                action: "approve".to_string(),
            }
        );
    }

    #[test]
    fn test_no_eligible_transition() {
        let engine = FlowEngine::new();
        let definition = purchase_flow();

        let error = engine
            .resolve_transition(
                &definition,
                "director",
                &Action::named("escalate"),
                &high_value_context(),
            )
            .expect_err("Director has no escalate transition");
        assert!(matches!(error, ResolutionError::NoEligibleTransition { .. }));

        let result = engine
            .resolve_transition(&definition, "director", &Action::Auto, &high_value_context());
        assert!(result.is_ok(), "unconditioned transitions are always eligible");

        // No conditions pass and there is no default.

        let definition = FlowDefinition::new(
            "strict",
            "Strict",
            vec![
                Stage::new("start", "Start", Status::InProcess).with_transition(
                    Transition::to(Status::Approved)
                        .with_condition(Condition::new("amount", Operator::LessThan, 100).into()),
                ),
                Stage::new("ok", "Ok", Status::Approved),
            ],
        );
        let error = engine
            .resolve_transition(&definition, "start", &Action::Auto, &high_value_context())
            .expect_err("Nothing should match");
        assert_eq!(
            error.to_string(),
            "No eligible transition from stage 'start' for action '<auto>'"
        );
    }

    #[test]
    fn test_unknown_stage() {
        let engine = FlowEngine::new();
        let definition = purchase_flow();

        let error = engine
            .resolve_transition(&definition, "nowhere", &Action::Auto, &high_value_context())
            .expect_err("Stage should not exist");
        assert_eq!(error, ResolutionError::StageNotFound("nowhere".to_string()));

        let approval = approval_at(&definition, "nowhere");
        let error = engine
            .resolve(&definition, &approval, &Action::Auto, &high_value_context())
            .expect_err("Stage should not exist");
        assert_eq!(error, ResolutionError::StageNotFound("nowhere".to_string()));
    }

    #[test]
    fn test_terminal_approval_cannot_be_resolved() {
        let engine = FlowEngine::new();
        let definition = purchase_flow();
        let mut approval = start_approval(&definition);
        approval.status = Status::End;
        approval.current_stage_id = None;

        let error = engine
            .resolve(&definition, &approval, &Action::named("approve"), &high_value_context())
            .expect_err("Terminal approvals are closed");
        assert_eq!(error, ResolutionError::AlreadyTerminal(Status::End));
    }

    #[test]
    fn test_iteration_limit_on_second_return() {
        let engine = FlowEngine::new();
        let definition = review_loop_flow(Some(1));
        let context = EvaluationContext::default();
        let submit = Action::named("submit");
        let send_back = Action::named("return");

        let mut approval = start_approval(&definition);
        approval = advance(&engine, &definition, &approval, &submit, &context);
        approval = advance(&engine, &definition, &approval, &send_back, &context);
        assert_eq!(approval.current_stage_id.as_deref(), Some("draft"));
        assert_eq!(approval.visits("draft"), 2);

        approval = advance(&engine, &definition, &approval, &submit, &context);
        let error = engine
            .resolve(&definition, &approval, &send_back, &context)
            .expect_err("Second return should exceed the limit");
        assert_eq!(
            error,
            ResolutionError::IterationLimitExceeded {
                stage_id: "draft".to_string(),
                visits: 2,
                limit: 1,
            }
        );

        // The reviewer can still move forward.
        let approve = Action::named("approve");
        let approved = advance(&engine, &definition, &approval, &approve, &context);
        assert_eq!(approved.status, Status::Approved);
    }

    #[test]
    fn test_default_iteration_limit_from_config() {
        let engine = FlowEngine::builder().default_max_iterations(1).build();
        let definition = review_loop_flow(None);
        let context = EvaluationContext::default();
        let submit = Action::named("submit");
        let send_back = Action::named("return");

        let mut approval = start_approval(&definition);
        for _ in 0..1 {
            approval = advance(&engine, &definition, &approval, &submit, &context);
            approval = advance(&engine, &definition, &approval, &send_back, &context);
        }
        approval = advance(&engine, &definition, &approval, &submit, &context);
        let error = engine
            .resolve(&definition, &approval, &send_back, &context)
            .expect_err("Config limit should apply");
        assert!(matches!(error, ResolutionError::IterationLimitExceeded { limit: 1, .. }));

        // Without any limit the loop can continue indefinitely.
        let unlimited = FlowEngine::new();
        for _ in 0..5 {
            approval = advance(&unlimited, &definition, &approval, &send_back, &context);
            approval = advance(&unlimited, &definition, &approval, &submit, &context);
        }
        assert_eq!(approval.iteration, 13);
    }

    #[test]
    fn test_conditions_see_workflow_iteration() {
        let engine = FlowEngine::new();
        let definition = FlowDefinition::new(
            "retry",
            "Retry",
            vec![
                Stage::new("start", "Start", Status::InProcess)
                    .with_transition(
                        Transition::to(Status::End).with_condition(
                            Condition::new("workflow.iteration", Operator::GreaterThanOrEqual, 2)
                                .into(),
                        ),
                    )
                    .with_transition(
                        Transition::to("retry")
                            .with_target_stage("start")
                            .as_default(),
                    ),
                Stage::new("again", "Again", "retry"),
                Stage::new("closed", "Closed", Status::End),
            ],
        );

        let mut approval = start_approval(&definition);
        for _ in 0..2 {
            let context = EvaluationContext::for_approval(&approval, json!({}));
            approval = advance(&engine, &definition, &approval, &Action::Auto, &context);
            assert_eq!(approval.current_stage_id.as_deref(), Some("start"));
        }
        let context = EvaluationContext::for_approval(&approval, json!({}));
        approval = advance(&engine, &definition, &approval, &Action::Auto, &context);
        assert_eq!(approval.status, Status::End);
        assert_eq!(approval.iteration, 3);
    }

    #[test]
    fn test_auto_resolution_over_deeply_nested_conditions() {
        let engine = FlowEngine::new();
        let definition = nested_condition_flow(100_000);
        let approval = start_approval(&definition);

        let resolved = engine
            .resolve(&definition, &approval, &Action::Auto, &high_value_context())
            .expect("Failed to resolve");
        assert_eq!(resolved.matched_by, MatchedBy::Conditions);
        assert_eq!(resolved.status, Status::Approved);
        assert!(resolved.transition == definition.stages[0].transitions[0]);

        let transition = engine
            .resolve_transition(&definition, "start", &Action::Auto, &low_value_context())
            .expect("Failed to resolve");
        assert_eq!(transition.to, Status::Reject);

        let updated = engine
            .apply_transition(&approval, &resolved, "alice", None)
            .expect("Failed to commit");
        assert_eq!(updated.status, Status::Approved);
    }

    #[test]
    fn test_exhausted_iteration_counter() {
        let engine = FlowEngine::new();
        let definition = purchase_flow();
        let mut approval = start_approval(&definition);
        approval.iteration = u32::MAX;

        let error = engine
            .resolve(&definition, &approval, &Action::Auto, &low_value_context())
            .expect_err("The counter cannot advance");
        assert_eq!(
            error,
            ResolutionError::IterationLimitExceeded {
                stage_id: "review".to_string(),
                visits: u32::MAX,
                limit: u32::MAX,
            }
        );
    }
}
