//! Custom actions for the Customer actor.
//!
//! Operations that don't fit the update payload. These are handled by
//! [`ActorEntity::handle_action`](crate::framework::ActorEntity::handle_action).

/// Custom actions for Customer entities.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomerAction {
    /// Soft delete (`false`) or reactivate (`true`).
    SetActive(bool),
}

/// Results from CustomerActions - variants match 1:1 with CustomerAction
#[derive(Debug, Clone, PartialEq)]
pub enum CustomerActionResult {
    /// Whether the flag actually changed.
    SetActive { changed: bool },
}
