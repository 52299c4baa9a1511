//! Tests for static status-path verification.
mod common;
use common::*;
use shonin::prelude::*;

#[cfg(test)]
mod path_tests {
    use super::*;

    fn two_stage() -> FlowDefinition {
        FlowDefinition::from_json(TWO_STAGE_FLOW_JSON).expect("Failed to parse flow")
    }

    #[test]
    fn test_connected_path_is_valid() {
        let evaluation =
            FlowEngine::new().evaluate_flow_path(&two_stage(), &["in_process", "approved"]);
        assert!(evaluation.is_valid);
        assert!(evaluation.issues.is_empty());
    }

    #[test]
    fn test_missing_stage_and_transition() {
        let evaluation =
            FlowEngine::new().evaluate_flow_path(&two_stage(), &["in_process", "reject"]);
        assert!(!evaluation.is_valid);
        assert_eq!(
            evaluation.issues,
            vec![
                "No stage found for status 'reject'".to_string(),
                "No transition from status 'in_process' to status 'reject' in stage 'start'"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_sequence_is_invalid() {
        let statuses: [&str; 0] = [];
        let evaluation = FlowEngine::new().evaluate_flow_path(&two_stage(), &statuses);
        assert!(!evaluation.is_valid);
        assert_eq!(evaluation.issues, vec!["Status sequence is empty".to_string()]);
    }

    #[test]
    fn test_single_status() {
        let engine = FlowEngine::new();
        assert!(engine.evaluate_flow_path(&two_stage(), &["approved"]).is_valid);
        assert!(!engine.evaluate_flow_path(&two_stage(), &["draft"]).is_valid);
    }

    #[test]
    fn test_longer_paths_ignore_conditions() {
        let engine = FlowEngine::new();
        let definition = purchase_flow();
        let statuses = vec![
            "in_process".to_string(),
            "escalated".to_string(),
            "in_process".to_string(),
            "escalated".to_string(),
            "reject".to_string(),
        ];
        assert!(engine.evaluate_flow_path(&definition, &statuses).is_valid);

        let evaluation = engine.evaluate_flow_path(&definition, &["in_process", "reject"]);
        assert_eq!(evaluation.issues.len(), 1);
    }

    #[test]
    fn test_terminal_status_has_no_outgoing_transitions() {
        let evaluation =
            FlowEngine::new().evaluate_flow_path(&two_stage(), &["approved", "in_process"]);
        assert!(!evaluation.is_valid);
        assert_eq!(
            evaluation.issues,
            vec![
                "No transition from status 'approved' to status 'in_process' in stage 'done'"
                    .to_string()
            ]
        );
    }
}
