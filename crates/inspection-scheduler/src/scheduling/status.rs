use serde::{Deserialize, Serialize};

use super::domain::AppointmentStatus;

/// Operator actions that move an appointment out of `Scheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusChange {
    Cancel,
    Complete,
}

impl StatusChange {
    pub const fn label(self) -> &'static str {
        match self {
            StatusChange::Cancel => "cancel",
            StatusChange::Complete => "complete",
        }
    }

    const fn target(self) -> AppointmentStatus {
        match self {
            StatusChange::Cancel => AppointmentStatus::Cancelled,
            StatusChange::Complete => AppointmentStatus::Completed,
        }
    }
}

/// Rejected attempt to move an appointment out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} an appointment with status {current}", .change.label())]
pub struct InvalidTransition {
    pub current: AppointmentStatus,
    pub change: StatusChange,
}

impl AppointmentStatus {
    /// Resolves the status reached by `change`, leaving `self` untouched on rejection.
    pub fn apply(self, change: StatusChange) -> Result<AppointmentStatus, InvalidTransition> {
        match self {
            AppointmentStatus::Scheduled => Ok(change.target()),
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => Err(InvalidTransition {
                current: self,
                change,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_accepts_both_operator_actions() {
        assert_eq!(
            AppointmentStatus::Scheduled.apply(StatusChange::Cancel),
            Ok(AppointmentStatus::Cancelled)
        );
        assert_eq!(
            AppointmentStatus::Scheduled.apply(StatusChange::Complete),
            Ok(AppointmentStatus::Completed)
        );
    }

    #[test]
    fn terminal_states_reject_every_action() {
        for current in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            for change in [StatusChange::Cancel, StatusChange::Complete] {
                let err = current.apply(change).expect_err("terminal state");
                assert_eq!(err.current, current);
                assert_eq!(err.change, change);
            }
        }
    }

    #[test]
    fn rejection_message_reports_current_status() {
        let err = AppointmentStatus::Completed
            .apply(StatusChange::Cancel)
            .expect_err("completed is terminal");
        assert_eq!(
            err.to_string(),
            "cannot cancel an appointment with status completed"
        );
    }
}
