use crate::flow::FlowDefinition;
use itertools::Itertools;
use serde::Serialize;

/// Result of checking a literal status sequence against a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEvaluation {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

/// Checks that every status in `statuses` has a stage and that each consecutive
/// pair is connected by a transition declared on the earlier stage.
///
/// This is a static check: conditions are not evaluated and no approval is involved.
pub fn evaluate_path<S: AsRef<str>>(definition: &FlowDefinition, statuses: &[S]) -> PathEvaluation {
    if statuses.is_empty() {
        return PathEvaluation {
            is_valid: false,
            issues: vec!["Status sequence is empty".to_string()],
        };
    }

    let index = definition.status_index();
    let mut issues = Vec::new();

    for status in statuses.iter().map(AsRef::<str>::as_ref).unique() {
        if !index.contains_key(status) {
            issues.push(format!("No stage found for status '{}'", status));
        }
    }

    for (from, to) in statuses.iter().map(AsRef::<str>::as_ref).tuple_windows() {
        let Some(stage) = index.get(from) else {
            continue;
        };
        if !stage.transitions.iter().any(|t| t.to.as_str() == to) {
            issues.push(format!(
                "No transition from status '{}' to status '{}' in stage '{}'",
                from, to, stage.id
            ));
        }
    }

    PathEvaluation {
        is_valid: issues.is_empty(),
        issues,
    }
}
