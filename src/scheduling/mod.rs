//! Scheduling core: slot generation, booking rules and plan day scheduling.
//!
//! Everything in this module is synchronous and free of I/O. Services load the
//! persisted state, read the clock and hand both to these functions.

pub mod booking;
pub mod dates;
pub mod plan;
pub mod slots;

pub use booking::{BookedInterval, Transition};
pub use plan::{PausePolicy, PauseState, Schedule, WeekdaySelection};
pub use slots::{DateBlock, Slot, SlotPolicy, WeeklyWindow};
