//! Booking overlap rule and status state machine

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::booking::{BookingAction, BookingStatus},
};

/// Time a non-cancelled booking occupies on its calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub date: NaiveDate,
    pub start_minute: i32,
    pub duration_minutes: i32,
}

impl BookedInterval {
    pub fn end_minute(&self) -> i32 {
        self.start_minute + self.duration_minutes
    }

    /// Half-open `[start, start + duration)` intersection on the same date
    pub fn overlaps(&self, other: &BookedInterval) -> bool {
        self.date == other.date
            && self.start_minute < other.end_minute()
            && other.start_minute < self.end_minute()
    }
}

/// First existing interval that conflicts with `candidate`
pub fn find_conflict<'a>(
    candidate: &BookedInterval,
    existing: &'a [BookedInterval],
) -> Option<&'a BookedInterval> {
    existing.iter().find(|b| b.overlaps(candidate))
}

/// Outcome of applying an action to a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Persist the new status
    Apply(BookingStatus),
    /// Already in the requested state; nothing to write
    Unchanged,
}

/// PENDING -> CONFIRMED -> COMPLETED, PENDING|CONFIRMED -> CANCELLED.
/// Cancelling a cancelled booking succeeds without change.
pub fn transition(current: BookingStatus, action: BookingAction) -> AppResult<Transition> {
    use BookingAction::*;
    use BookingStatus::*;

    match (current, action) {
        (Pending, Confirm) => Ok(Transition::Apply(Confirmed)),
        (Confirmed, Complete) => Ok(Transition::Apply(Completed)),
        (Pending | Confirmed, Cancel) => Ok(Transition::Apply(Cancelled)),
        (Cancelled, Cancel) => Ok(Transition::Unchanged),
        (status, action) => Err(AppError::InvalidState(format!(
            "Cannot {} a booking that is {}",
            action, status
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(start: i32, duration: i32) -> BookedInterval {
        BookedInterval {
            date: NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
            start_minute: start,
            duration_minutes: duration,
        }
    }

    #[test]
    fn test_adjacent_bookings_do_not_overlap() {
        assert!(!interval(540, 30).overlaps(&interval(570, 30)));
        assert!(!interval(570, 30).overlaps(&interval(540, 30)));
    }

    #[test]
    fn test_partial_and_nested_overlap() {
        assert!(interval(540, 30).overlaps(&interval(555, 30)));
        assert!(interval(540, 120).overlaps(&interval(600, 15)));
        assert!(interval(600, 15).overlaps(&interval(540, 120)));
    }

    #[test]
    fn test_different_dates_never_overlap() {
        let mut other = interval(540, 30);
        other.date = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
        assert!(!interval(540, 30).overlaps(&other));
    }

    #[test]
    fn test_find_conflict() {
        let existing = vec![interval(540, 30), interval(600, 30)];
        assert_eq!(find_conflict(&interval(570, 30), &existing), None);
        assert_eq!(find_conflict(&interval(610, 30), &existing), Some(&existing[1]));
    }

    #[test]
    fn test_confirm_only_from_pending() {
        use BookingStatus::*;
        assert_eq!(
            transition(Pending, BookingAction::Confirm).unwrap(),
            Transition::Apply(Confirmed)
        );
        for status in [Confirmed, Cancelled, Completed] {
            assert!(matches!(
                transition(status, BookingAction::Confirm),
                Err(AppError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn test_complete_only_from_confirmed() {
        use BookingStatus::*;
        assert_eq!(
            transition(Confirmed, BookingAction::Complete).unwrap(),
            Transition::Apply(Completed)
        );
        for status in [Pending, Cancelled, Completed] {
            assert!(transition(status, BookingAction::Complete).is_err());
        }
    }

    #[test]
    fn test_cancel_is_idempotent_but_not_after_completion() {
        use BookingStatus::*;
        assert_eq!(
            transition(Pending, BookingAction::Cancel).unwrap(),
            Transition::Apply(Cancelled)
        );
        assert_eq!(
            transition(Confirmed, BookingAction::Cancel).unwrap(),
            Transition::Apply(Cancelled)
        );
        assert_eq!(
            transition(Cancelled, BookingAction::Cancel).unwrap(),
            Transition::Unchanged
        );
        assert!(transition(Completed, BookingAction::Cancel).is_err());
    }

    #[test]
    fn test_terminal_states_are_closed() {
        use BookingStatus::*;
        for status in [Cancelled, Completed] {
            for action in [BookingAction::Confirm, BookingAction::Complete] {
                assert!(transition(status, action).is_err());
            }
        }
    }
}
