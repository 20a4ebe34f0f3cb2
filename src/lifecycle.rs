//! Booking lifecycle rules.
//!
//! The persisted transitions in the handlers are all conditional updates
//! (`UPDATE .. WHERE status = expected`), so these rules are also enforced
//! against concurrent requests: the second of two racing transitions sees
//! zero affected rows and fails with a conflict.

use crate::entities::booking::BookingStatus;
use crate::entities::vehicle::VehicleType;

/// Fixed driver share of a completed booking's total price.
pub const DRIVER_SHARE: f64 = 0.70;

/// Terminal statuses, for use in SQL `IN` / `NOT IN` filters. Must agree
/// with [`BookingStatus::is_terminal`].
pub const TERMINAL_STATUSES: [BookingStatus; 3] = [
    BookingStatus::Completed,
    BookingStatus::Cancelled,
    BookingStatus::Rejected,
];

impl BookingStatus {
    /// Terminal states admit no further lifecycle transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Rejected
        )
    }

    /// The expected current status for each forward transition.
    /// Cancellation is handled separately since it is valid from any
    /// non-terminal state.
    pub fn required_predecessor(self) -> Option<BookingStatus> {
        match self {
            BookingStatus::Approved => Some(BookingStatus::PendingApproval),
            BookingStatus::Rejected => Some(BookingStatus::PendingApproval),
            BookingStatus::Confirmed => Some(BookingStatus::Approved),
            BookingStatus::InProgress => Some(BookingStatus::Confirmed),
            BookingStatus::Completed => Some(BookingStatus::InProgress),
            BookingStatus::PendingApproval | BookingStatus::Cancelled => None,
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        if next == BookingStatus::Cancelled {
            return !self.is_terminal();
        }
        next.required_predecessor() == Some(self)
    }

    /// Whether a booking in this state holds its vehicle (the vehicle must
    /// show IN_USE and be released when the booking ends).
    pub fn holds_vehicle(self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::InProgress)
    }
}

pub fn driver_earnings(total_price: f64) -> f64 {
    total_price * DRIVER_SHARE
}

/// Per-km tariff by vehicle class, used to quote a booking price at creation.
fn rate_per_km(vehicle_type: &VehicleType) -> f64 {
    match vehicle_type {
        VehicleType::Sedan => 12.0,
        VehicleType::Suv => 15.0,
        VehicleType::Van => 18.0,
        VehicleType::Truck => 25.0,
        VehicleType::Bus => 30.0,
    }
}

const BASE_FARE: f64 = 50.0;

pub fn quote_price(vehicle_type: &VehicleType, distance_km: f64) -> f64 {
    let raw = BASE_FARE + distance_km * rate_per_km(vehicle_type);
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(BookingStatus::PendingApproval.can_transition_to(BookingStatus::Approved));
        assert!(BookingStatus::Approved.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::InProgress));
        assert!(BookingStatus::InProgress.can_transition_to(BookingStatus::Completed));
    }

    #[test]
    fn test_approve_requires_pending() {
        // Re-approving an approved booking must be refused, not repeated
        assert!(!BookingStatus::Approved.can_transition_to(BookingStatus::Approved));
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Approved));
        assert!(!BookingStatus::Rejected.can_transition_to(BookingStatus::Approved));
    }

    #[test]
    fn test_reject_requires_pending() {
        assert!(BookingStatus::PendingApproval.can_transition_to(BookingStatus::Rejected));
        assert!(!BookingStatus::Approved.can_transition_to(BookingStatus::Rejected));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Rejected));
    }

    #[test]
    fn test_complete_requires_in_progress() {
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Completed));
        assert!(!BookingStatus::PendingApproval.can_transition_to(BookingStatus::Completed));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Completed));
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        assert!(BookingStatus::PendingApproval.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::Approved.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::InProgress.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Rejected.can_transition_to(BookingStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Rejected.is_terminal());
        assert!(!BookingStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_vehicle_held_states() {
        // A confirmed booking holds its vehicle, so cancelling one must
        // release the vehicle back to available
        assert!(BookingStatus::Confirmed.holds_vehicle());
        assert!(BookingStatus::InProgress.holds_vehicle());
        assert!(!BookingStatus::PendingApproval.holds_vehicle());
        assert!(!BookingStatus::Approved.holds_vehicle());
        assert!(!BookingStatus::Completed.holds_vehicle());
    }

    #[test]
    fn test_terminal_statuses_match_predicate() {
        use sea_orm::Iterable;

        for status in BookingStatus::iter() {
            assert_eq!(TERMINAL_STATUSES.contains(&status), status.is_terminal());
        }
    }

    #[test]
    fn test_driver_earnings_split() {
        assert_eq!(driver_earnings(1000.0), 700.0);
        assert_eq!(driver_earnings(0.0), 0.0);
    }

    #[test]
    fn test_quote_price_increases_with_distance() {
        let short = quote_price(&VehicleType::Sedan, 5.0);
        let long = quote_price(&VehicleType::Sedan, 50.0);
        assert!(long > short);
        assert_eq!(short, 110.0); // 50 + 5 * 12
    }
}
