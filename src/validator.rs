//! Structural validation of flow definitions.
//!
//! Validation never evaluates conditions and does not require stages to be
//! reachable: a transition may target a status defined later in the list, and
//! unreachable stages only produce warnings.

use crate::error::{ValidationError, ValidationIssue};
use crate::flow::{FlowDefinition, SemVer, Stage};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::collections::VecDeque;

/// Everything the validator found: blocking issues and design-time warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Returns `true` when `definition` is structurally well-formed.
pub fn validate(definition: &FlowDefinition) -> bool {
    inspect(definition).is_valid()
}

/// Like [`validate`], but returns the issues as a typed error.
pub fn check(definition: &FlowDefinition) -> Result<(), ValidationError> {
    let report = inspect(definition);
    if report.is_valid() {
        Ok(())
    } else {
        Err(ValidationError {
            issues: report.issues,
        })
    }
}

/// Runs every structural check and collects the results.
pub fn inspect(definition: &FlowDefinition) -> ValidationReport {
    FlowValidator::new(definition).run()
}

struct FlowValidator<'a> {
    definition: &'a FlowDefinition,
    stage_ids: AHashSet<&'a str>,
    statuses: AHashSet<&'a str>,
    report: ValidationReport,
}

impl<'a> FlowValidator<'a> {
    fn new(definition: &'a FlowDefinition) -> Self {
        Self {
            definition,
            stage_ids: definition.stages.iter().map(|s| s.id.as_str()).collect(),
            statuses: definition.stages.iter().map(|s| s.status.as_str()).collect(),
            report: ValidationReport::default(),
        }
    }

    fn run(mut self) -> ValidationReport {
        let definition = self.definition;
        if definition.version.parse::<SemVer>().is_err() {
            self.issue(ValidationIssue::InvalidVersion(definition.version.clone()));
        }

        if definition.stages.is_empty() {
            self.issue(ValidationIssue::NoStages);
            return self.report;
        }

        for (index, stage) in definition.stages.iter().enumerate() {
            self.check_required_fields(index, stage);
        }
        self.check_duplicates();
        for stage in &definition.stages {
            self.check_transitions(stage);
        }
        self.collect_unreachable();

        self.report
    }

    fn issue(&mut self, issue: ValidationIssue) {
        self.report.issues.push(issue);
    }

    fn check_required_fields(&mut self, stage_index: usize, stage: &Stage) {
        let fields = [
            ("id", stage.id.as_str()),
            ("name", stage.name.as_str()),
            ("description", stage.description.as_str()),
            ("status", stage.status.as_str()),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                self.issue(ValidationIssue::MissingField { stage_index, field });
            }
        }
    }

    fn check_duplicates(&mut self) {
        let stages = &self.definition.stages;
        let duplicate_ids: Vec<String> = stages
            .iter()
            .map(|s| s.id.as_str())
            .filter(|id| !id.is_empty())
            .duplicates()
            .map(str::to_string)
            .collect();
        let duplicate_statuses: Vec<String> = stages
            .iter()
            .map(|s| s.status.as_str())
            .filter(|status| !status.is_empty())
            .duplicates()
            .map(str::to_string)
            .collect();

        for id in duplicate_ids {
            self.issue(ValidationIssue::DuplicateStageId(id));
        }
        for status in duplicate_statuses {
            self.issue(ValidationIssue::DuplicateStatus(status));
        }
    }

    fn check_transitions(&mut self, stage: &Stage) {
        if stage.transitions.iter().filter(|t| t.is_default).count() > 1 {
            self.issue(ValidationIssue::MultipleDefaults(stage.id.clone()));
        }

        for transition in &stage.transitions {
            if !self.statuses.contains(transition.to.as_str()) {
                self.issue(ValidationIssue::DanglingTargetStatus {
                    stage_id: stage.id.clone(),
                    status: transition.to.to_string(),
                });
            }
            if let Some(target) = &transition.target_stage_id {
                if !self.stage_ids.contains(target.as_str()) {
                    self.issue(ValidationIssue::DanglingTargetStage {
                        stage_id: stage.id.clone(),
                        target_stage_id: target.clone(),
                    });
                }
            }
            if transition.conditions.iter().any(|c| c.has_empty_group()) {
                self.issue(ValidationIssue::EmptyConditionGroup(stage.id.clone()));
            }
        }
    }

    /// Breadth-first walk from the entry stage; anything not reached is a warning.
    fn collect_unreachable(&mut self) {
        let stages = &self.definition.stages;
        let by_id: AHashMap<&str, &Stage> = stages.iter().map(|s| (s.id.as_str(), s)).collect();
        let by_status = self.definition.status_index();

        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut queue: VecDeque<&Stage> = stages.first().into_iter().collect();
        while let Some(stage) = queue.pop_front() {
            if !seen.insert(stage.id.as_str()) {
                continue;
            }
            for transition in &stage.transitions {
                let next = match &transition.target_stage_id {
                    Some(id) => by_id.get(id.as_str()),
                    None => by_status.get(transition.to.as_str()),
                };
                if let Some(&next) = next {
                    queue.push_back(next);
                }
            }
        }

        let entry = stages.first().map(|s| s.id.as_str()).unwrap_or_default();
        let warnings = stages
            .iter()
            .filter(|s| !seen.contains(s.id.as_str()))
            .map(|s| format!("Stage '{}' is unreachable from entry stage '{}'", s.id, entry))
            .collect::<Vec<_>>();
        self.report.warnings.extend(warnings);
    }
}
