//! Workflow checklist tracked inside a work order.
//!
//! Steps advance in template order: a step may start or complete only once
//! every earlier required step is completed or skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::text_enum::text_enum;
use crate::domain::{Error, UserId};

text_enum! {
    /// Identifier of a workflow step in the default template.
    pub enum WorkflowStepKey {
        CheckIn => "check_in",
        Inspection => "inspection",
        Diagnosis => "diagnosis",
        EstimateApproval => "estimate_approval",
        Repair => "repair",
        QualityCheck => "quality_check",
        ReadyForPickup => "ready_for_pickup",
    }
}

text_enum! {
    /// Progress of a single workflow step.
    pub enum StepStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Skipped => "skipped",
    }
}

text_enum! {
    /// Operation requested on a workflow step.
    pub enum StepAction {
        Start => "start",
        Complete => "complete",
        Skip => "skip",
    }
}

impl WorkflowStepKey {
    /// Human readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::CheckIn => "Vehicle check-in",
            Self::Inspection => "Inspection",
            Self::Diagnosis => "Diagnosis",
            Self::EstimateApproval => "Estimate approval",
            Self::Repair => "Repair",
            Self::QualityCheck => "Quality check",
            Self::ReadyForPickup => "Ready for pickup",
        }
    }

    /// Whether the step must be finished before the order can complete.
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::EstimateApproval)
    }
}

impl StepStatus {
    /// Completed or skipped.
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }
}

/// A checklist entry on a work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub key: WorkflowStepKey,
    pub label: String,
    pub status: StepStatus,
    pub required: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<UserId>,
}

/// The default seven step template.
pub fn default_workflow() -> Vec<WorkflowStep> {
    WorkflowStepKey::ALL
        .iter()
        .map(|key| WorkflowStep {
            key: *key,
            label: key.label().to_owned(),
            status: StepStatus::Pending,
            required: key.is_required(),
            started_at: None,
            completed_at: None,
            completed_by: None,
        })
        .collect()
}

/// Required steps that are neither completed nor skipped.
pub fn pending_required(steps: &[WorkflowStep]) -> Vec<WorkflowStepKey> {
    steps
        .iter()
        .filter(|step| step.required && !step.status.is_done())
        .map(|step| step.key)
        .collect()
}

fn step_conflict(key: WorkflowStepKey, message: String) -> Error {
    Error::conflict(message).with_details(json!({ "step": key.as_str() }))
}

/// Apply `action` to the step identified by `key`.
pub fn apply_step_action(
    steps: &mut [WorkflowStep],
    key: WorkflowStepKey,
    action: StepAction,
    by: UserId,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let missing = || Error::not_found(format!("workflow step {key} not found"));
    let index = steps
        .iter()
        .position(|step| step.key == key)
        .ok_or_else(missing)?;
    let (earlier, rest) = steps.split_at_mut(index);
    let step = rest.first_mut().ok_or_else(missing)?;

    if action != StepAction::Skip {
        let blocking: Vec<&str> = earlier
            .iter()
            .filter(|step| step.required && !step.status.is_done())
            .map(|step| step.key.as_str())
            .collect();
        if !blocking.is_empty() {
            return Err(Error::conflict(format!(
                "cannot {action} {key} before earlier required steps are finished"
            ))
            .with_details(json!({ "step": key.as_str(), "blockedBy": blocking })));
        }
    }

    match (action, step.status) {
        (StepAction::Start, StepStatus::Pending) => {
            step.status = StepStatus::InProgress;
            step.started_at = Some(now);
        }
        (StepAction::Complete, StepStatus::Pending | StepStatus::InProgress) => {
            step.status = StepStatus::Completed;
            step.started_at.get_or_insert(now);
            step.completed_at = Some(now);
            step.completed_by = Some(by);
        }
        (StepAction::Skip, StepStatus::Pending | StepStatus::InProgress) => {
            if step.required {
                return Err(step_conflict(key, format!("required step {key} cannot be skipped")));
            }
            step.status = StepStatus::Skipped;
            step.completed_at = Some(now);
            step.completed_by = Some(by);
        }
        (_, current) => {
            return Err(step_conflict(key, format!("cannot {action} step {key} while {current}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn run(steps: &mut [WorkflowStep], key: WorkflowStepKey, action: StepAction) -> Result<(), Error> {
        apply_step_action(steps, key, action, UserId::random(), Utc::now())
    }

    #[rstest]
    fn template_has_one_optional_step() {
        let steps = default_workflow();
        assert_eq!(steps.len(), 7);
        let optional: Vec<_> = steps.iter().filter(|s| !s.required).map(|s| s.key).collect();
        assert_eq!(optional, vec![WorkflowStepKey::EstimateApproval]);
        assert_eq!(pending_required(&steps).len(), 6);
    }

    #[rstest]
    fn later_steps_wait_for_earlier_required_steps() {
        let mut steps = default_workflow();
        let err = run(&mut steps, WorkflowStepKey::Diagnosis, StepAction::Start).expect_err("blocked");
        assert_eq!(err.code(), ErrorCode::Conflict);
        let blocked = &err.details().expect("details")["blockedBy"];
        assert_eq!(blocked, &json!(["check_in", "inspection"]));
    }

    #[rstest]
    fn optional_step_does_not_block_later_steps() {
        let mut steps = default_workflow();
        for key in [WorkflowStepKey::CheckIn, WorkflowStepKey::Inspection, WorkflowStepKey::Diagnosis] {
            run(&mut steps, key, StepAction::Complete).expect("complete in order");
        }
        run(&mut steps, WorkflowStepKey::Repair, StepAction::Start).expect("estimate approval is optional");
    }

    #[rstest]
    fn only_optional_steps_can_be_skipped() {
        let mut steps = default_workflow();
        let err = run(&mut steps, WorkflowStepKey::CheckIn, StepAction::Skip).expect_err("required");
        assert_eq!(err.code(), ErrorCode::Conflict);
        run(&mut steps, WorkflowStepKey::EstimateApproval, StepAction::Skip).expect("optional skip");
        let skipped = steps.iter().find(|s| s.key == WorkflowStepKey::EstimateApproval);
        assert_eq!(skipped.map(|s| s.status), Some(StepStatus::Skipped));
    }

    #[rstest]
    fn completed_steps_cannot_restart() {
        let mut steps = default_workflow();
        run(&mut steps, WorkflowStepKey::CheckIn, StepAction::Start).expect("start");
        run(&mut steps, WorkflowStepKey::CheckIn, StepAction::Complete).expect("complete");
        let check_in = steps.first().expect("check-in step");
        assert!(check_in.started_at.is_some());
        assert!(check_in.completed_by.is_some());
        let err = run(&mut steps, WorkflowStepKey::CheckIn, StepAction::Start).expect_err("done");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    fn steps_missing_from_the_workflow_are_not_found() {
        let mut steps = default_workflow();
        steps.retain(|s| s.key != WorkflowStepKey::Repair);
        let err = run(&mut steps, WorkflowStepKey::Repair, StepAction::Start).expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(run(&mut [], WorkflowStepKey::CheckIn, StepAction::Complete).is_err());
    }

    #[rstest]
    fn final_step_completes_once_the_rest_are_done() {
        let mut steps = default_workflow();
        for key in WorkflowStepKey::ALL.iter().filter(|key| key.is_required()) {
            run(&mut steps, *key, StepAction::Complete).expect("complete in order");
        }
        let last = steps.last().expect("final step");
        assert_eq!(last.key, WorkflowStepKey::ReadyForPickup);
        assert_eq!(last.status, StepStatus::Completed);
        assert!(pending_required(&steps).is_empty());
    }
}
