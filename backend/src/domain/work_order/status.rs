//! Work-order status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::text_enum::text_enum;
use crate::domain::UserId;

text_enum! {
    /// Lifecycle status of a work order.
    pub enum WorkOrderStatus {
        Pending => "pending",
        InProgress => "in_progress",
        WaitingParts => "waiting_parts",
        OnHold => "on_hold",
        Completed => "completed",
        Invoiced => "invoiced",
        Cancelled => "cancelled",
    }
}

impl WorkOrderStatus {
    /// Statuses reachable from `self` in one step.
    pub const fn allowed_targets(self) -> &'static [WorkOrderStatus] {
        use WorkOrderStatus as S;
        match self {
            S::Pending => &[S::InProgress, S::OnHold, S::Cancelled],
            S::InProgress => &[S::WaitingParts, S::OnHold, S::Completed, S::Cancelled],
            S::WaitingParts => &[S::InProgress, S::OnHold, S::Cancelled],
            S::OnHold => &[S::InProgress, S::Cancelled],
            S::Completed => &[S::Invoiced, S::InProgress],
            S::Invoiced | S::Cancelled => &[],
        }
    }

    /// Whether the transition table allows `self -> to`.
    pub fn can_transition_to(self, to: WorkOrderStatus) -> bool {
        self.allowed_targets().contains(&to)
    }

    /// No further transitions are possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Invoiced | Self::Cancelled)
    }

    /// Work is still outstanding.
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::InProgress | Self::WaitingParts | Self::OnHold
        )
    }

    /// Service and part lines are frozen.
    pub const fn locks_lines(self) -> bool {
        matches!(self, Self::Completed | Self::Invoiced | Self::Cancelled)
    }
}

/// One entry of a work order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub from: Option<WorkOrderStatus>,
    pub to: WorkOrderStatus,
    pub changed_by: UserId,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}
