//! Result approval workflow.
//!
//! A result moves through `draft -> submitted -> hod_approved -> dean_approved -> approved`.
//! Any approval stage may send it to `rejected`, from where the lecturer fixes and resubmits.
//! Everything here is pure; persistence and permission scoping live with the callers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "result_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Draft,
    Submitted,
    HodApproved,
    DeanApproved,
    Approved,
    Rejected,
}

impl ResultStatus {
    pub const ALL: [ResultStatus; 6] = [
        ResultStatus::Draft,
        ResultStatus::Submitted,
        ResultStatus::HodApproved,
        ResultStatus::DeanApproved,
        ResultStatus::Approved,
        ResultStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Draft => "draft",
            ResultStatus::Submitted => "submitted",
            ResultStatus::HodApproved => "hod_approved",
            ResultStatus::DeanApproved => "dean_approved",
            ResultStatus::Approved => "approved",
            ResultStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResultStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown result status: {}", s))
    }
}

/// The actor positions in the approval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Lecturer,
    Hod,
    Dean,
    Senate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Lecturer => "lecturer",
            Stage::Hod => "hod",
            Stage::Dean => "dean",
            Stage::Senate => "senate",
        }
    }

    /// Map a user role to the approval stage it acts at. Only approvers have one;
    /// lecturers act through course ownership rather than their role.
    pub fn approver_for_role(role: &str) -> Option<Stage> {
        match role {
            "hod" => Some(Stage::Hod),
            "dean" => Some(Stage::Dean),
            "senate" => Some(Stage::Senate),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lecturer" => Ok(Stage::Lecturer),
            "hod" => Ok(Stage::Hod),
            "dean" => Ok(Stage::Dean),
            "senate" => Ok(Stage::Senate),
            _ => Err(format!("Unknown workflow stage: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Submit,
    Approve,
    Reject,
}

impl WorkflowAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Submit => "submit",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("cannot {action} a result that is {from}")]
    InvalidTransition {
        from: ResultStatus,
        action: WorkflowAction,
    },

    #[error("a result that is {status} awaits the {expected}, not the {actual}")]
    WrongStage {
        status: ResultStatus,
        expected: Stage,
        actual: Stage,
    },

    #[error("result is {0} and can no longer be edited directly; file an edit request")]
    Locked(ResultStatus),

    #[error("result is {0} and can be edited directly; no edit request is needed")]
    NotLocked(ResultStatus),

    #[error("an edit request on a result that is {status} is reviewed by the {expected}, not the {actual}")]
    WrongReviewer {
        status: ResultStatus,
        expected: Stage,
        actual: Stage,
    },
}

/// The stage that must act next on a result in `status`.
pub fn awaiting_stage(status: ResultStatus) -> Option<Stage> {
    match status {
        ResultStatus::Draft | ResultStatus::Rejected => Some(Stage::Lecturer),
        ResultStatus::Submitted => Some(Stage::Hod),
        ResultStatus::HodApproved => Some(Stage::Dean),
        ResultStatus::DeanApproved => Some(Stage::Senate),
        ResultStatus::Approved => None,
    }
}

/// The status a result waits in for `stage` to approve it.
pub fn status_awaiting(stage: Stage) -> &'static [ResultStatus] {
    match stage {
        Stage::Lecturer => &[ResultStatus::Draft, ResultStatus::Rejected],
        Stage::Hod => &[ResultStatus::Submitted],
        Stage::Dean => &[ResultStatus::HodApproved],
        Stage::Senate => &[ResultStatus::DeanApproved],
    }
}

pub fn is_editable(status: ResultStatus) -> bool {
    matches!(status, ResultStatus::Draft | ResultStatus::Rejected)
}

pub fn is_published(status: ResultStatus) -> bool {
    status == ResultStatus::Approved
}

/// Who reviews an edit request filed against a locked result.
pub fn edit_reviewer(status: ResultStatus) -> Option<Stage> {
    match status {
        ResultStatus::Draft | ResultStatus::Rejected => None,
        ResultStatus::Submitted | ResultStatus::HodApproved => Some(Stage::Hod),
        ResultStatus::DeanApproved => Some(Stage::Dean),
        ResultStatus::Approved => Some(Stage::Senate),
    }
}

/// Compute the next status, or explain why `stage` may not apply `action` now.
pub fn transition(
    current: ResultStatus,
    action: WorkflowAction,
    stage: Stage,
) -> Result<ResultStatus, WorkflowError> {
    let invalid = WorkflowError::InvalidTransition {
        from: current,
        action,
    };

    if current == ResultStatus::Approved {
        return Err(invalid);
    }

    let expected = awaiting_stage(current).ok_or(invalid.clone())?;

    match action {
        WorkflowAction::Submit => {
            if !is_editable(current) {
                return Err(invalid);
            }
            if stage != Stage::Lecturer {
                return Err(WorkflowError::WrongStage {
                    status: current,
                    expected,
                    actual: stage,
                });
            }
            Ok(ResultStatus::Submitted)
        }
        WorkflowAction::Approve | WorkflowAction::Reject => {
            if is_editable(current) {
                return Err(invalid);
            }
            if stage != expected {
                return Err(WorkflowError::WrongStage {
                    status: current,
                    expected,
                    actual: stage,
                });
            }
            if action == WorkflowAction::Reject {
                return Ok(ResultStatus::Rejected);
            }
            Ok(match current {
                ResultStatus::Submitted => ResultStatus::HodApproved,
                ResultStatus::HodApproved => ResultStatus::DeanApproved,
                ResultStatus::DeanApproved => ResultStatus::Approved,
                _ => return Err(invalid),
            })
        }
    }
}

/// Guard a direct score change by the lecturer.
pub fn ensure_editable(status: ResultStatus) -> Result<(), WorkflowError> {
    if is_editable(status) {
        Ok(())
    } else {
        Err(WorkflowError::Locked(status))
    }
}

/// Guard filing an edit request and return the stage that must review it.
pub fn ensure_edit_request_allowed(status: ResultStatus) -> Result<Stage, WorkflowError> {
    edit_reviewer(status).ok_or(WorkflowError::NotLocked(status))
}

/// Guard reviewing an edit request. The reviewer follows the result's
/// current status, not the one it had when the request was filed.
pub fn ensure_edit_reviewer(status: ResultStatus, stage: Stage) -> Result<(), WorkflowError> {
    let expected = ensure_edit_request_allowed(status)?;
    if expected != stage {
        return Err(WorkflowError::WrongReviewer {
            status,
            expected,
            actual: stage,
        });
    }
    Ok(())
}
