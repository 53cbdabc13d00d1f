//! Plan scheduling service: initial schedule, replan, pause and resume

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use validator::Validate;

use crate::{
    config::SchedulingConfig,
    error::{AppError, AppResult},
    models::{
        event::DomainEvent,
        plan::{
            AssignedPlan, CreatePlan, PauseRequest, PlanWeek, ReplanRequest, ScheduleRequest,
            ScheduleStatus,
        },
    },
    repository::Repository,
    scheduling::{
        dates::{parse_date, parse_optional_date},
        plan::{self, generate_initial_schedule, sessions_per_week},
        PausePolicy, WeekdaySelection,
    },
};

use super::events::EventBus;

#[derive(Clone)]
pub struct PlansService {
    repository: Repository,
    events: EventBus,
    pause_policy: PausePolicy,
}

impl PlansService {
    pub fn new(repository: Repository, events: EventBus, config: &SchedulingConfig) -> Self {
        Self {
            repository,
            events,
            pause_policy: PausePolicy {
                cooldown: Duration::days(config.pause_cooldown_days),
                max_weeks: config.max_pause_weeks,
            },
        }
    }

    /// Register a plan delivered by the plan catalog, unscheduled
    pub async fn create(&self, data: &CreatePlan) -> AppResult<AssignedPlan> {
        data.validate()?;
        let start_date = parse_date(&data.start_date, "start_date")?;
        validate_weeks(&data.weeks)?;

        let plan = self
            .repository
            .plans
            .create(
                &data.athlete_id,
                data.coach_id.as_deref(),
                &data.name,
                start_date,
                &data.weeks,
            )
            .await?;
        tracing::info!(plan_id = plan.id, athlete_id = %plan.athlete_id, "Plan registered");
        Ok(plan)
    }

    /// Read a plan; a pause that has run out is ended on the way
    pub async fn get(&self, id: i32) -> AppResult<AssignedPlan> {
        let plan = self.repository.plans.get_by_id(id).await?;
        self.expire_pause(plan, Utc::now()).await
    }

    pub async fn list_by_athlete(&self, athlete_id: &str) -> AppResult<Vec<AssignedPlan>> {
        let plans = self.repository.plans.list_by_athlete(athlete_id).await?;
        let now = Utc::now();
        let mut result = Vec::with_capacity(plans.len());
        for plan in plans {
            result.push(self.expire_pause(plan, now).await?);
        }
        Ok(result)
    }

    /// Bind every session to a date and activate the plan
    pub async fn schedule(&self, id: i32, request: &ScheduleRequest) -> AppResult<AssignedPlan> {
        let plan = self.get(id).await?;
        plan::ensure_unscheduled(plan.schedule_status)?;
        let start_date = parse_optional_date(request.start_date.as_deref(), "start_date")?
            .unwrap_or(plan.start_date);
        let weekdays = WeekdaySelection::new(&request.weekdays, sessions_per_week(&plan.weeks)?)?;

        let schedule = generate_initial_schedule(&plan.weeks, &weekdays, start_date)?;
        let updated = self
            .repository
            .plans
            .save_schedule(
                id,
                &plan.pause_state(),
                &schedule,
                &weekdays.to_vec(),
                ScheduleStatus::Active,
            )
            .await?;

        tracing::info!(
            plan_id = id,
            %start_date,
            sessions = updated.schedule.len(),
            "Plan scheduled"
        );
        self.events.publish(DomainEvent::PlanScheduled {
            plan_id: id,
            athlete_id: updated.athlete_id.clone(),
            coach_id: updated.coach_id.clone(),
            replanned: false,
        });
        Ok(updated)
    }

    /// Move the remaining sessions onto new weekdays, keeping entries dated
    /// before `from_date` (today when omitted)
    pub async fn replan(&self, id: i32, request: &ReplanRequest) -> AppResult<AssignedPlan> {
        let plan = self.get(id).await?;
        let from = parse_optional_date(request.from_date.as_deref(), "from_date")?
            .unwrap_or_else(|| Utc::now().date_naive());
        let weekdays = WeekdaySelection::new(&request.weekdays, sessions_per_week(&plan.weeks)?)?;

        let outcome = plan::replan(&plan.weeks, &plan.schedule, &weekdays, from)?;
        let status = match plan.schedule_status {
            ScheduleStatus::Pending => ScheduleStatus::Active,
            other => other,
        };
        let updated = self
            .repository
            .plans
            .save_schedule(
                id,
                &plan.pause_state(),
                &outcome.schedule,
                &weekdays.to_vec(),
                status,
            )
            .await?;

        tracing::info!(
            plan_id = id,
            from_date = %from,
            preserved = outcome.preserved,
            covered_weeks = outcome.covered_weeks,
            rescheduled = outcome.rescheduled,
            "Plan replanned"
        );
        self.events.publish(DomainEvent::PlanScheduled {
            plan_id: id,
            athlete_id: updated.athlete_id.clone(),
            coach_id: updated.coach_id.clone(),
            replanned: true,
        });
        Ok(updated)
    }

    pub async fn pause(&self, id: i32, request: &PauseRequest) -> AppResult<AssignedPlan> {
        let plan = self.get(id).await?;
        let now = Utc::now();

        let state = plan::pause(&plan.pause_state(), request.weeks, now, &self.pause_policy)?;
        let updated = self
            .repository
            .plans
            .save_pause_state(id, &plan.pause_state(), &state)
            .await?;

        tracing::info!(plan_id = id, weeks = request.weeks, pause_until = ?updated.pause_until, "Plan paused");
        if let Some(pause_until) = updated.pause_until {
            self.events.publish(DomainEvent::PlanPaused {
                plan_id: id,
                athlete_id: updated.athlete_id.clone(),
                coach_id: updated.coach_id.clone(),
                pause_until,
            });
        }
        Ok(updated)
    }

    pub async fn resume(&self, id: i32) -> AppResult<AssignedPlan> {
        let plan = self.get(id).await?;
        let state = plan::resume(&plan.pause_state())?;
        if plan.schedule_status == ScheduleStatus::Active {
            return Ok(plan);
        }
        self.store_resume(plan, &state).await
    }

    async fn expire_pause(&self, plan: AssignedPlan, now: DateTime<Utc>) -> AppResult<AssignedPlan> {
        if !plan::pause_expired(&plan.pause_state(), now) {
            return Ok(plan);
        }
        let state = plan::resume(&plan.pause_state())?;
        tracing::info!(plan_id = plan.id, "Pause period over, resuming plan");
        let id = plan.id;
        match self.store_resume(plan, &state).await {
            // another request got there first; its write is the current row
            Err(AppError::InvalidState(_)) => self.repository.plans.get_by_id(id).await,
            other => other,
        }
    }

    async fn store_resume(
        &self,
        plan: AssignedPlan,
        state: &plan::PauseState,
    ) -> AppResult<AssignedPlan> {
        let updated = self
            .repository
            .plans
            .save_pause_state(plan.id, &plan.pause_state(), state)
            .await?;
        tracing::info!(plan_id = plan.id, "Plan resumed");
        self.events.publish(DomainEvent::PlanResumed {
            plan_id: plan.id,
            athlete_id: updated.athlete_id.clone(),
            coach_id: updated.coach_id.clone(),
        });
        Ok(updated)
    }
}

/// Plans must have a uniform week shape and globally unique session ids
fn validate_weeks(weeks: &[PlanWeek]) -> AppResult<()> {
    sessions_per_week(weeks)?;
    let mut seen = HashSet::new();
    for session in weeks.iter().flat_map(|w| &w.sessions) {
        if session.id.trim().is_empty() {
            return Err(AppError::Validation("Session ids cannot be empty".to_string()));
        }
        if !seen.insert(session.id.as_str()) {
            return Err(AppError::Validation(format!(
                "Session id '{}' appears more than once",
                session.id
            )));
        }
    }
    Ok(())
}
