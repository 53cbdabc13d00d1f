//! Training plan day scheduling
//!
//! Coaches write plans as ordered sessions per week without fixing the weekday.
//! The athlete later picks as many weekdays as there are sessions per week and
//! the functions below bind every session to a concrete date.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::dates::{date_key, parse_date, week_anchor};
use crate::{
    error::{AppError, AppResult},
    models::plan::{PlanSession, PlanWeek, ScheduleStatus},
};

/// Calendar date (`YYYY-MM-DD`) to session id
pub type Schedule = BTreeMap<String, String>;

/// Distinct weekdays (0 = Monday) chosen by the athlete, sorted ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekdaySelection(Vec<u8>);

impl WeekdaySelection {
    /// Validate a raw weekday list against the plan's sessions per week
    pub fn new(days: &[i16], sessions_per_week: usize) -> AppResult<Self> {
        let mut seen = BTreeSet::new();
        for &day in days {
            if !(0..=6).contains(&day) {
                return Err(AppError::Validation(format!(
                    "Weekday {} is out of range (0=Monday .. 6=Sunday)",
                    day
                )));
            }
            if !seen.insert(day as u8) {
                return Err(AppError::Validation(format!("Weekday {} chosen twice", day)));
            }
        }
        if seen.len() != sessions_per_week {
            return Err(AppError::Validation(format!(
                "Choose exactly {} weekdays, one per weekly session (got {})",
                sessions_per_week,
                seen.len()
            )));
        }
        Ok(Self(seen.into_iter().collect()))
    }

    pub fn days(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<i16> {
        self.0.iter().map(|&d| i16::from(d)).collect()
    }
}

/// Number of sessions in each week; every week must have the same count
pub fn sessions_per_week(weeks: &[PlanWeek]) -> AppResult<usize> {
    let first = weeks
        .first()
        .ok_or_else(|| AppError::Validation("Plan has no weeks".to_string()))?;
    let count = first.sessions.len();
    if count == 0 {
        return Err(AppError::Validation("First plan week has no sessions".to_string()));
    }
    if count > 7 {
        return Err(AppError::Validation(format!(
            "A week cannot hold {} sessions on distinct weekdays",
            count
        )));
    }
    if let Some((index, week)) = weeks
        .iter()
        .enumerate()
        .find(|(_, w)| w.sessions.len() != count)
    {
        return Err(AppError::Validation(format!(
            "Week {} has {} sessions but week 1 has {}; varying weekly session counts are not supported",
            index + 1,
            week.sessions.len(),
            count
        )));
    }
    Ok(count)
}

/// Sessions of a week ordered by their `order` field
fn ordered_sessions(week: &PlanWeek) -> Vec<&PlanSession> {
    let mut sessions: Vec<&PlanSession> = week.sessions.iter().collect();
    sessions.sort_by_key(|s| s.order);
    sessions
}

fn offset_date(anchor: NaiveDate, week: usize, day: u8) -> NaiveDate {
    anchor + Duration::days(7 * week as i64 + i64::from(day))
}

/// Initial binding: week `w`, session `s` lands on `monday(start) + 7w + days[s]`
pub fn generate_initial_schedule(
    weeks: &[PlanWeek],
    weekdays: &WeekdaySelection,
    start_date: NaiveDate,
) -> AppResult<Schedule> {
    let per_week = sessions_per_week(weeks)?;
    if weekdays.days().len() != per_week {
        return Err(AppError::Validation(format!(
            "Choose exactly {} weekdays",
            per_week
        )));
    }

    let anchor = week_anchor(start_date);
    let mut schedule = Schedule::new();
    for (w, week) in weeks.iter().enumerate() {
        for (session, &day) in ordered_sessions(week).into_iter().zip(weekdays.days()) {
            schedule.insert(date_key(offset_date(anchor, w, day)), session.id.clone());
        }
    }
    Ok(schedule)
}

/// Result of a replan, with counts for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplanOutcome {
    pub schedule: Schedule,
    pub preserved: usize,
    pub covered_weeks: usize,
    pub rescheduled: usize,
}

/// Keep every entry dated before `from` and place the remaining sessions, in
/// plan order, onto the chosen weekdays of successive weeks starting with the
/// week of `from`. Candidate dates before `from` are skipped.
pub fn replan(
    weeks: &[PlanWeek],
    existing: &Schedule,
    weekdays: &WeekdaySelection,
    from: NaiveDate,
) -> AppResult<ReplanOutcome> {
    let per_week = sessions_per_week(weeks)?;
    if weekdays.days().len() != per_week {
        return Err(AppError::Validation(format!(
            "Choose exactly {} weekdays",
            per_week
        )));
    }

    let mut preserved = Schedule::new();
    for (key, session_id) in existing {
        let date = parse_date(key, "schedule date")
            .map_err(|_| AppError::Internal(format!("Stored schedule has invalid date {}", key)))?;
        if date < from {
            preserved.insert(key.clone(), session_id.clone());
        }
    }
    let done: HashSet<&str> = preserved.values().map(String::as_str).collect();

    let covered_weeks = weeks
        .iter()
        .take_while(|w| w.sessions.iter().all(|s| done.contains(s.id.as_str())))
        .count();

    let pending: Vec<&PlanSession> = weeks[covered_weeks..]
        .iter()
        .flat_map(ordered_sessions)
        .filter(|s| !done.contains(s.id.as_str()))
        .collect();

    let anchor = week_anchor(from);
    let mut schedule = preserved.clone();
    let mut queue = pending.iter().peekable();
    let mut week = 0;
    while queue.peek().is_some() {
        for &day in weekdays.days() {
            let date = offset_date(anchor, week, day);
            if date < from {
                continue;
            }
            match queue.next() {
                Some(session) => {
                    schedule.insert(date_key(date), session.id.clone());
                }
                None => break,
            }
        }
        week += 1;
    }

    Ok(ReplanOutcome {
        preserved: preserved.len(),
        covered_weeks,
        rescheduled: pending.len(),
        schedule,
    })
}

/// The initial schedule is generated once; afterwards only a replan may move
/// sessions, so dated history is never rewritten.
pub fn ensure_unscheduled(status: ScheduleStatus) -> AppResult<()> {
    match status {
        ScheduleStatus::Pending => Ok(()),
        ScheduleStatus::Active | ScheduleStatus::Paused => Err(AppError::InvalidState(
            "Plan is already scheduled; replan it to change weekdays".to_string(),
        )),
    }
}

/// Pause bookkeeping of an assigned plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseState {
    pub status: ScheduleStatus,
    pub paused_at: Option<DateTime<Utc>>,
    pub pause_until: Option<DateTime<Utc>>,
    pub last_pause_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
pub struct PausePolicy {
    pub cooldown: Duration,
    pub max_weeks: i32,
}

impl Default for PausePolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::days(30),
            max_weeks: 12,
        }
    }
}

/// Pause for `weeks` weeks. The cooldown since the last successful pause is
/// checked before anything else.
pub fn pause(
    state: &PauseState,
    weeks: i32,
    now: DateTime<Utc>,
    policy: &PausePolicy,
) -> AppResult<PauseState> {
    if let Some(last) = state.last_pause_date {
        let elapsed = now - last;
        if elapsed < policy.cooldown {
            let remaining = policy.cooldown - elapsed;
            let days = (remaining.num_hours() + 23) / 24;
            return Err(AppError::Cooldown {
                message: format!(
                    "Plan was paused recently; you can pause again in {} day(s)",
                    days.max(1)
                ),
                retry_after_seconds: remaining.num_seconds(),
            });
        }
    }

    if state.status == ScheduleStatus::Pending {
        return Err(AppError::InvalidState(
            "Plan has no schedule yet and cannot be paused".to_string(),
        ));
    }
    if weeks < 1 || weeks > policy.max_weeks {
        return Err(AppError::Validation(format!(
            "Pause length must be between 1 and {} weeks",
            policy.max_weeks
        )));
    }

    Ok(PauseState {
        status: ScheduleStatus::Paused,
        paused_at: Some(now),
        pause_until: Some(now + Duration::weeks(i64::from(weeks))),
        last_pause_date: Some(now),
    })
}

/// Resume a paused plan; resuming an active plan changes nothing
pub fn resume(state: &PauseState) -> AppResult<PauseState> {
    match state.status {
        ScheduleStatus::Pending => Err(AppError::InvalidState(
            "Plan has no schedule yet and cannot be resumed".to_string(),
        )),
        ScheduleStatus::Active | ScheduleStatus::Paused => Ok(PauseState {
            status: ScheduleStatus::Active,
            paused_at: None,
            pause_until: None,
            last_pause_date: state.last_pause_date,
        }),
    }
}

/// Whether a paused plan has reached its `pause_until`
pub fn pause_expired(state: &PauseState, now: DateTime<Utc>) -> bool {
    state.status == ScheduleStatus::Paused
        && state.pause_until.map(|until| until <= now).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn plan(weeks: usize, per_week: usize) -> Vec<PlanWeek> {
        (0..weeks)
            .map(|w| PlanWeek {
                name: None,
                // reverse declaration order to prove sorting uses `order`
                sessions: (0..per_week)
                    .rev()
                    .map(|s| PlanSession {
                        id: format!("w{}s{}", w, s),
                        order: s as i32,
                        name: None,
                    })
                    .collect(),
            })
            .collect()
    }

    fn entries(schedule: &Schedule) -> Vec<(&str, &str)> {
        schedule.iter().map(|(d, s)| (d.as_str(), s.as_str())).collect()
    }

    #[test]
    fn test_weekday_selection_validation() {
        assert!(WeekdaySelection::new(&[0, 2, 4], 3).is_ok());
        assert_eq!(WeekdaySelection::new(&[4, 0, 2], 3).unwrap().days(), &[0, 2, 4]);
        assert!(WeekdaySelection::new(&[0, 2], 3).is_err());
        assert!(WeekdaySelection::new(&[0, 0, 2], 3).is_err());
        assert!(WeekdaySelection::new(&[0, 7, 2], 3).is_err());
        assert!(WeekdaySelection::new(&[-1, 2, 3], 3).is_err());
    }

    #[test]
    fn test_sessions_per_week_requires_uniform_weeks() {
        assert_eq!(sessions_per_week(&plan(2, 3)).unwrap(), 3);
        assert!(sessions_per_week(&[]).is_err());
        let mut uneven = plan(2, 3);
        uneven[1].sessions.pop();
        assert!(matches!(sessions_per_week(&uneven), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_initial_schedule_anchors_on_monday() {
        // 2025-01-15 is a Wednesday; anchor is Monday 2025-01-13
        let weeks = plan(2, 3);
        let days = WeekdaySelection::new(&[0, 2, 4], 3).unwrap();
        let schedule = generate_initial_schedule(&weeks, &days, date("2025-01-15")).unwrap();
        assert_eq!(
            entries(&schedule),
            vec![
                ("2025-01-13", "w0s0"),
                ("2025-01-15", "w0s1"),
                ("2025-01-17", "w0s2"),
                ("2025-01-20", "w1s0"),
                ("2025-01-22", "w1s1"),
                ("2025-01-24", "w1s2"),
            ]
        );
    }

    #[test]
    fn test_initial_schedule_only_references_plan_sessions() {
        let weeks = plan(4, 2);
        let days = WeekdaySelection::new(&[1, 5], 2).unwrap();
        let schedule = generate_initial_schedule(&weeks, &days, date("2025-03-03")).unwrap();
        let ids: HashSet<String> = weeks
            .iter()
            .flat_map(|w| w.sessions.iter().map(|s| s.id.clone()))
            .collect();
        assert_eq!(schedule.len(), 8);
        assert!(schedule.values().all(|id| ids.contains(id)));
    }

    #[test]
    fn test_replan_mid_week_preserves_history() {
        // two sessions per week, originally Monday/Friday from 2025-01-13
        let weeks = plan(2, 2);
        let original = generate_initial_schedule(
            &weeks,
            &WeekdaySelection::new(&[0, 4], 2).unwrap(),
            date("2025-01-13"),
        )
        .unwrap();
        // replan on Thursday 2025-01-16 onto Tuesday/Thursday
        let days = WeekdaySelection::new(&[1, 3], 2).unwrap();
        let outcome = replan(&weeks, &original, &days, date("2025-01-16")).unwrap();

        assert_eq!(outcome.preserved, 1);
        assert_eq!(outcome.covered_weeks, 0);
        assert_eq!(outcome.rescheduled, 3);
        assert_eq!(
            entries(&outcome.schedule),
            vec![
                ("2025-01-13", "w0s0"),
                ("2025-01-16", "w0s1"),
                ("2025-01-21", "w1s0"),
                ("2025-01-23", "w1s1"),
            ]
        );
    }

    #[test]
    fn test_replan_on_week_boundary_regenerates_remaining_weeks() {
        let weeks = plan(3, 3);
        let original = generate_initial_schedule(
            &weeks,
            &WeekdaySelection::new(&[0, 2, 4], 3).unwrap(),
            date("2025-01-13"),
        )
        .unwrap();
        let days = WeekdaySelection::new(&[1, 3, 5], 3).unwrap();
        let outcome = replan(&weeks, &original, &days, date("2025-01-20")).unwrap();

        assert_eq!(outcome.covered_weeks, 1);
        assert_eq!(outcome.schedule.len(), 9);
        for (d, s) in original.iter().filter(|(d, _)| d.as_str() < "2025-01-20") {
            assert_eq!(outcome.schedule.get(d), Some(s));
        }
        assert_eq!(outcome.schedule.get("2025-01-21").map(String::as_str), Some("w1s0"));
        assert_eq!(outcome.schedule.get("2025-02-01").map(String::as_str), Some("w2s2"));
    }

    #[test]
    fn test_replan_without_history_equals_initial_from_date() {
        let weeks = plan(2, 2);
        let days = WeekdaySelection::new(&[0, 3], 2).unwrap();
        let outcome = replan(&weeks, &Schedule::new(), &days, date("2025-01-13")).unwrap();
        let initial = generate_initial_schedule(&weeks, &days, date("2025-01-13")).unwrap();
        assert_eq!(outcome.schedule, initial);
    }

    fn at(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap() + Duration::days(day)
    }

    fn active() -> PauseState {
        PauseState {
            status: ScheduleStatus::Active,
            paused_at: None,
            pause_until: None,
            last_pause_date: None,
        }
    }

    #[test]
    fn test_pause_cooldown_window() {
        let policy = PausePolicy::default();
        let first = pause(&active(), 2, at(0), &policy).unwrap();
        assert_eq!(first.status, ScheduleStatus::Paused);
        assert_eq!(first.pause_until, Some(at(14)));
        assert_eq!(first.last_pause_date, Some(at(0)));

        let err = pause(&first, 1, at(10), &policy).unwrap_err();
        match err {
            AppError::Cooldown { retry_after_seconds, .. } => {
                assert_eq!(retry_after_seconds, Duration::days(20).num_seconds())
            }
            other => panic!("expected cooldown, got {:?}", other),
        }

        let again = pause(&first, 1, at(31), &policy).unwrap();
        assert_eq!(again.last_pause_date, Some(at(31)));
    }

    #[test]
    fn test_cooldown_applies_after_resume() {
        let policy = PausePolicy::default();
        let paused = pause(&active(), 1, at(0), &policy).unwrap();
        let resumed = resume(&paused).unwrap();
        assert_eq!(resumed.status, ScheduleStatus::Active);
        assert_eq!(resumed.paused_at, None);
        assert_eq!(resumed.pause_until, None);
        assert!(matches!(
            pause(&resumed, 1, at(5), &policy),
            Err(AppError::Cooldown { .. })
        ));
    }

    #[test]
    fn test_pause_requires_schedule_and_sane_length() {
        let policy = PausePolicy::default();
        let mut pending = active();
        pending.status = ScheduleStatus::Pending;
        assert!(matches!(
            pause(&pending, 1, at(0), &policy),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(pause(&active(), 0, at(0), &policy), Err(AppError::Validation(_))));
        assert!(matches!(pause(&active(), 13, at(0), &policy), Err(AppError::Validation(_))));
        assert!(resume(&pending).is_err());
    }

    #[test]
    fn test_initial_schedule_only_from_pending() {
        assert!(ensure_unscheduled(ScheduleStatus::Pending).is_ok());
        assert!(matches!(
            ensure_unscheduled(ScheduleStatus::Active),
            Err(AppError::InvalidState(_))
        ));
        let paused = pause(&active(), 2, at(0), &PausePolicy::default()).unwrap();
        assert!(matches!(
            ensure_unscheduled(paused.status),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn test_pause_expiry() {
        let paused = pause(&active(), 1, at(0), &PausePolicy::default()).unwrap();
        assert!(!pause_expired(&paused, at(6)));
        assert!(pause_expired(&paused, at(7)));
        assert!(!pause_expired(&active(), at(100)));
    }
}
