//! Entry status lifecycle and account roles.
//!
//! An entry moves through a fixed, forward-only state machine:
//!
//! ```text
//! received ──(worker: complete)──▶ completed ──(student: pickup)──▶ picked_up
//! ```
//!
//! The backend is the authority on whether a transition is legal. The
//! predicates here exist so that front ends only offer actions valid for the
//! current state.

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a laundry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Recorded at the counter by a worker; being washed.
    #[default]
    Received,
    /// Washed and waiting for the student.
    Completed,
    /// Collected by the student. Terminal.
    PickedUp,
}

impl EntryStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Received, Self::Completed, Self::PickedUp];

    /// Whether the state machine allows moving from `self` to `to`.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Received, Self::Completed) | (Self::Completed, Self::PickedUp)
        )
    }

    /// The status that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Received => Some(Self::Completed),
            Self::Completed => Some(Self::PickedUp),
            Self::PickedUp => None,
        }
    }

    /// Whether no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::PickedUp)
    }

    /// Wire representation (`received`, `completed`, `picked_up`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Completed => "completed",
            Self::PickedUp => "picked_up",
        }
    }

    /// Badge text shown on the student's history cards.
    #[must_use]
    pub const fn student_label(self) -> &'static str {
        match self {
            Self::Received => "In Progress",
            Self::Completed => "Ready for pickup",
            Self::PickedUp => "Picked Up",
        }
    }

    /// Badge text shown in the worker's entry table.
    #[must_use]
    pub const fn worker_label(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Completed => "completed",
            Self::PickedUp => "picked up",
        }
    }

    /// The action `role` may trigger on an entry in this status, if any.
    #[must_use]
    pub const fn available_action(self, role: Role) -> Option<EntryAction> {
        match (self, role) {
            (Self::Received, Role::Worker) => Some(EntryAction::Complete),
            (Self::Completed, Role::Student) => Some(EntryAction::Pickup),
            _ => None,
        }
    }
}

/// Free-function form of [`EntryStatus::can_transition_to`].
#[must_use]
pub const fn is_transition_allowed(from: EntryStatus, to: EntryStatus) -> bool {
    from.can_transition_to(to)
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "completed" => Ok(Self::Completed),
            "picked_up" => Ok(Self::PickedUp),
            _ => Err(format!("invalid entry status: {s}")),
        }
    }
}

/// A state-transition request a user can issue against an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryAction {
    /// `received → completed`, issued by a worker.
    Complete,
    /// `completed → picked_up`, issued by the owning student.
    Pickup,
}

impl EntryAction {
    /// Status the entry must be in for the action to make sense.
    #[must_use]
    pub const fn from_status(self) -> EntryStatus {
        match self {
            Self::Complete => EntryStatus::Received,
            Self::Pickup => EntryStatus::Completed,
        }
    }

    /// Status the entry ends up in.
    #[must_use]
    pub const fn to_status(self) -> EntryStatus {
        match self {
            Self::Complete => EntryStatus::Completed,
            Self::Pickup => EntryStatus::PickedUp,
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A student who hands in laundry.
    Student,
    /// Laundry counter staff.
    Worker,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Worker => write!(f, "worker"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "worker" => Ok(Self::Worker),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use EntryStatus::{Completed, PickedUp, Received};

        let allowed = [(Received, Completed), (Completed, PickedUp)];
        for from in EntryStatus::ALL {
            for to in EntryStatus::ALL {
                assert_eq!(
                    is_transition_allowed(from, to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_nothing_returns_to_received() {
        for from in EntryStatus::ALL {
            assert!(!from.can_transition_to(EntryStatus::Received));
        }
    }

    #[test]
    fn test_picked_up_is_terminal() {
        assert!(EntryStatus::PickedUp.is_terminal());
        assert_eq!(EntryStatus::PickedUp.next(), None);
        assert!(!EntryStatus::Completed.is_terminal());
    }

    #[test]
    fn test_next_follows_allowed_transitions() {
        for status in EntryStatus::ALL {
            if let Some(next) = status.next() {
                assert!(status.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_available_actions_per_role() {
        assert_eq!(
            EntryStatus::Received.available_action(Role::Worker),
            Some(EntryAction::Complete)
        );
        assert_eq!(EntryStatus::Received.available_action(Role::Student), None);
        assert_eq!(
            EntryStatus::Completed.available_action(Role::Student),
            Some(EntryAction::Pickup)
        );
        assert_eq!(EntryStatus::Completed.available_action(Role::Worker), None);
        assert_eq!(EntryStatus::PickedUp.available_action(Role::Student), None);
        assert_eq!(EntryStatus::PickedUp.available_action(Role::Worker), None);
    }

    #[test]
    fn test_actions_agree_with_state_machine() {
        for action in [EntryAction::Complete, EntryAction::Pickup] {
            assert!(is_transition_allowed(action.from_status(), action.to_status()));
        }
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&EntryStatus::PickedUp).unwrap(),
            "\"picked_up\""
        );
        let parsed: EntryStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, EntryStatus::Completed);
        assert!(serde_json::from_str::<EntryStatus>("\"lost\"").is_err());
    }

    #[test]
    fn test_status_from_str_roundtrips_display() {
        for status in EntryStatus::ALL {
            assert_eq!(status.to_string().parse::<EntryStatus>(), Ok(status));
        }
        assert!("Picked Up".parse::<EntryStatus>().is_err());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("worker".parse::<Role>(), Ok(Role::Worker));
        assert_eq!(Role::Student.to_string(), "student");
        assert!("admin".parse::<Role>().is_err());
    }
}
