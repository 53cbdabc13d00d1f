//! API integration tests
//!
//! Run against a live server with: cargo test -- --ignored
//! The server must share `JWT_SECRET` (or the default) with these tests.

use chrono::{Duration, Utc};
use coachbook_server::models::user::{Role, UserClaims};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".to_string())
}

/// Mint a token the way the identity service would
fn token_for(role: Role) -> (String, String) {
    let sub = format!("{:?}-{}", role, Uuid::new_v4()).to_lowercase();
    let now = Utc::now().timestamp();
    let claims = UserClaims {
        sub: sub.clone(),
        role,
        name: None,
        email: None,
        exp: now + 3600,
        iat: now,
    };
    let token = claims.create_token(&jwt_secret()).expect("Failed to sign token");
    (sub, token)
}

/// Public calendar open every day 09:00-12:00 with no notice period
async fn create_open_calendar(client: &Client, coach_token: &str) -> i64 {
    let response = client
        .post(format!("{}/calendars", BASE_URL))
        .bearer_auth(coach_token)
        .json(&json!({
            "name": "Check-in",
            "slot_duration_minutes": 30,
            "buffer_minutes": 0,
            "max_advance_days": 14,
            "min_notice_hours": 0,
            "is_public": true
        }))
        .send()
        .await
        .expect("Failed to create calendar");
    assert_eq!(response.status(), StatusCode::CREATED);
    let calendar: Value = response.json().await.expect("Failed to parse calendar");
    let id = calendar["id"].as_i64().expect("No calendar id");

    let windows: Vec<Value> = (0..7)
        .map(|day| json!({ "day_of_week": day, "start_time": "09:00", "end_time": "12:00" }))
        .collect();
    let response = client
        .put(format!("{}/calendars/{}/availability", BASE_URL, id))
        .bearer_auth(coach_token)
        .json(&json!({ "windows": windows }))
        .send()
        .await
        .expect("Failed to set availability");
    assert!(response.status().is_success());

    id
}

async fn first_slot(client: &Client, calendar_id: i64) -> Option<Value> {
    let from = Utc::now().date_naive() + Duration::days(1);
    let to = from + Duration::days(6);
    let slots: Vec<Value> = client
        .get(format!(
            "{}/slots?calendar_id={}&from={}&to={}",
            BASE_URL, calendar_id, from, to
        ))
        .send()
        .await
        .expect("Failed to list slots")
        .json()
        .await
        .expect("Failed to parse slots");
    slots.into_iter().next()
}

/// Two-week plan with two sessions a week, starting Wednesday 2025-01-15
async fn create_two_week_plan(client: &Client, coach_token: &str, athlete_id: &str) -> i64 {
    let response = client
        .post(format!("{}/plans", BASE_URL))
        .bearer_auth(coach_token)
        .json(&json!({
            "athlete_id": athlete_id,
            "name": "Base block",
            "start_date": "2025-01-15",
            "weeks": [
                { "sessions": [{ "id": "w1s1", "order": 1 }, { "id": "w1s2", "order": 2 }] },
                { "sessions": [{ "id": "w2s1", "order": 1 }, { "id": "w2s2", "order": 2 }] }
            ]
        }))
        .send()
        .await
        .expect("Failed to create plan");
    assert_eq!(response.status(), StatusCode::CREATED);
    let plan: Value = response.json().await.expect("Failed to parse plan");
    plan["id"].as_i64().expect("No plan id")
}

fn booking_request(calendar_id: i64, slot: &Value, name: &str) -> Value {
    json!({
        "calendar_id": calendar_id,
        "date": slot["date"],
        "time": slot["time"],
        "duration_minutes": slot["duration_minutes"],
        "booker_name": name
    })
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/plans", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_athlete_cannot_create_calendar() {
    let client = Client::new();
    let (_, token) = token_for(Role::Athlete);

    let response = client
        .post(format!("{}/calendars", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": "Nope" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_inverted_window_rejected() {
    let client = Client::new();
    let (_, token) = token_for(Role::Coach);
    let calendar_id = create_open_calendar(&client, &token).await;

    let response = client
        .put(format!("{}/calendars/{}/availability", BASE_URL, calendar_id))
        .bearer_auth(&token)
        .json(&json!({ "windows": [{ "day_of_week": 0, "start_time": "12:00", "end_time": "09:00" }] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The previous windows are untouched
    let windows: Vec<Value> = client
        .get(format!("{}/calendars/{}/availability", BASE_URL, calendar_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(windows.len(), 7);
}

#[tokio::test]
#[ignore]
async fn test_booking_lifecycle() {
    let client = Client::new();
    let (_, coach_token) = token_for(Role::Coach);
    let calendar_id = create_open_calendar(&client, &coach_token).await;

    let slot = first_slot(&client, calendar_id).await.expect("No slot offered");
    let request = json!({
        "calendar_id": calendar_id,
        "date": slot["date"],
        "time": slot["time"],
        "duration_minutes": slot["duration_minutes"],
        "booker_name": "Sam Runner",
        "booker_email": "sam@example.com"
    });

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&request)
        .send()
        .await
        .expect("Failed to create booking");
    assert_eq!(response.status(), StatusCode::CREATED);
    let booking: Value = response.json().await.expect("Failed to parse booking");
    assert_eq!(booking["status"], "pending");
    let booking_id = booking["id"].as_str().expect("No booking id").to_string();

    // The same slot cannot be taken twice
    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&request)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "SlotUnavailable");

    // ...and it is no longer offered
    let next = first_slot(&client, calendar_id).await.expect("No slot offered");
    assert_ne!((&next["date"], &next["time"]), (&slot["date"], &slot["time"]));

    let patch = |action: &'static str| {
        client
            .patch(format!("{}/bookings/{}", BASE_URL, booking_id))
            .bearer_auth(&coach_token)
            .json(&json!({ "action": action }))
            .send()
    };

    let response = patch("complete").await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = patch("confirm").await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse booking");
    assert_eq!(body["status"], "confirmed");

    let response = patch("confirm").await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = patch("cancel").await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    // Cancelling twice is accepted
    let response = patch("cancel").await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse booking");
    assert_eq!(body["status"], "cancelled");

    // The freed slot is offered again
    let again = first_slot(&client, calendar_id).await.expect("No slot offered");
    assert_eq!((&again["date"], &again["time"]), (&slot["date"], &slot["time"]));
}

#[tokio::test]
#[ignore]
async fn test_booking_off_grid_is_unavailable() {
    let client = Client::new();
    let (_, coach_token) = token_for(Role::Coach);
    let calendar_id = create_open_calendar(&client, &coach_token).await;
    let date = Utc::now().date_naive() + Duration::days(2);

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({
            "calendar_id": calendar_id,
            "date": date.to_string(),
            "time": "09:10",
            "duration_minutes": 30,
            "booker_name": "Off Grid"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_plan_schedule_pause_resume() {
    let client = Client::new();
    let (coach_id, coach_token) = token_for(Role::Coach);
    let (athlete_id, athlete_token) = token_for(Role::Athlete);

    let response = client
        .post(format!("{}/plans", BASE_URL))
        .bearer_auth(&coach_token)
        .json(&json!({
            "athlete_id": athlete_id,
            "name": "Base block",
            "start_date": "2025-01-15",
            "weeks": [
                { "sessions": [{ "id": "w1s1", "order": 1 }, { "id": "w1s2", "order": 2 }] },
                { "sessions": [{ "id": "w2s1", "order": 1 }, { "id": "w2s2", "order": 2 }] }
            ]
        }))
        .send()
        .await
        .expect("Failed to create plan");
    assert_eq!(response.status(), StatusCode::CREATED);
    let plan: Value = response.json().await.expect("Failed to parse plan");
    assert_eq!(plan["schedule_status"], "pending");
    assert_eq!(plan["coach_id"], coach_id.as_str());
    let plan_id = plan["id"].as_i64().expect("No plan id");

    // Wrong number of weekdays
    let response = client
        .post(format!("{}/plans/{}/schedule", BASE_URL, plan_id))
        .bearer_auth(&athlete_token)
        .json(&json!({ "weekdays": [0, 2, 4] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/plans/{}/schedule", BASE_URL, plan_id))
        .bearer_auth(&athlete_token)
        .json(&json!({ "weekdays": [0, 2] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse schedule");
    assert_eq!(body["schedule_status"], "active");
    assert_eq!(body["schedule"]["2025-01-13"], "w1s1");
    assert_eq!(body["schedule"]["2025-01-15"], "w1s2");
    assert_eq!(body["schedule"]["2025-01-20"], "w2s1");
    assert_eq!(body["schedule"]["2025-01-22"], "w2s2");

    let pause = || {
        client
            .post(format!("{}/plans/{}/pause", BASE_URL, plan_id))
            .bearer_auth(&athlete_token)
            .json(&json!({ "weeks": 2 }))
            .send()
    };

    let response = pause().await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse plan");
    assert_eq!(body["schedule_status"], "paused");

    let response = client
        .post(format!("{}/plans/{}/resume", BASE_URL, plan_id))
        .bearer_auth(&athlete_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse plan");
    assert_eq!(body["schedule_status"], "active");
    assert!(body["pause_until"].is_null());

    // Cooldown applies even after resuming
    let response = pause().await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "Cooldown");
    assert!(body["retry_after_seconds"].as_i64().unwrap_or_default() > 0);
}

#[tokio::test]
#[ignore]
async fn test_plan_hidden_from_strangers() {
    let client = Client::new();
    let (_, coach_token) = token_for(Role::Coach);
    let (athlete_id, _) = token_for(Role::Athlete);
    let (_, stranger_token) = token_for(Role::Athlete);

    let plan: Value = client
        .post(format!("{}/plans", BASE_URL))
        .bearer_auth(&coach_token)
        .json(&json!({
            "athlete_id": athlete_id,
            "name": "Private",
            "start_date": "2025-02-03",
            "weeks": [{ "sessions": [{ "id": "only", "order": 1 }] }]
        }))
        .send()
        .await
        .expect("Failed to create plan")
        .json()
        .await
        .expect("Failed to parse plan");

    let response = client
        .get(format!("{}/plans/{}", BASE_URL, plan["id"]))
        .bearer_auth(&stranger_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_bookings_for_one_slot() {
    let client = Client::new();
    let (_, coach_token) = token_for(Role::Coach);
    let calendar_id = create_open_calendar(&client, &coach_token).await;
    let slot = first_slot(&client, calendar_id).await.expect("No slot offered");

    let book = |name: &'static str| {
        client
            .post(format!("{}/bookings", BASE_URL))
            .json(&booking_request(calendar_id, &slot, name))
            .send()
    };
    let (first, second) = tokio::join!(book("First Runner"), book("Second Runner"));
    let first = first.expect("Failed to send request");
    let second = second.expect("Failed to send request");

    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let loser = if first.status() == StatusCode::CONFLICT { first } else { second };
    let body: Value = loser.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "SlotUnavailable");
}

#[tokio::test]
#[ignore]
async fn test_cancelled_slot_can_be_rebooked() {
    let client = Client::new();
    let (_, coach_token) = token_for(Role::Coach);
    let calendar_id = create_open_calendar(&client, &coach_token).await;
    let slot = first_slot(&client, calendar_id).await.expect("No slot offered");

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&booking_request(calendar_id, &slot, "Early Bird"))
        .send()
        .await
        .expect("Failed to create booking");
    assert_eq!(response.status(), StatusCode::CREATED);
    let booking: Value = response.json().await.expect("Failed to parse booking");

    let response = client
        .patch(format!("{}/bookings/{}", BASE_URL, booking["id"].as_str().expect("No booking id")))
        .bearer_auth(&coach_token)
        .json(&json!({ "action": "cancel" }))
        .send()
        .await
        .expect("Failed to cancel booking");
    assert_eq!(response.status(), StatusCode::OK);

    let again = first_slot(&client, calendar_id).await.expect("No slot offered");
    assert_eq!((&again["date"], &again["time"]), (&slot["date"], &slot["time"]));

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&booking_request(calendar_id, &slot, "Late Bird"))
        .send()
        .await
        .expect("Failed to rebook");
    assert_eq!(response.status(), StatusCode::CREATED);
    let rebooked: Value = response.json().await.expect("Failed to parse booking");
    assert_eq!(rebooked["status"], "pending");
    assert_ne!(rebooked["id"], booking["id"]);
}

#[tokio::test]
#[ignore]
async fn test_second_schedule_call_conflicts() {
    let client = Client::new();
    let (_, coach_token) = token_for(Role::Coach);
    let (athlete_id, athlete_token) = token_for(Role::Athlete);
    let plan_id = create_two_week_plan(&client, &coach_token, &athlete_id).await;

    let schedule = |weekdays: Value| {
        client
            .post(format!("{}/plans/{}/schedule", BASE_URL, plan_id))
            .bearer_auth(&athlete_token)
            .json(&json!({ "weekdays": weekdays }))
            .send()
    };

    let response = schedule(json!([0, 2])).await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = schedule(json!([1, 3])).await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "InvalidState");

    // History from the first call is intact
    let plan: Value = client
        .get(format!("{}/plans/{}", BASE_URL, plan_id))
        .bearer_auth(&athlete_token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse plan");
    assert_eq!(plan["schedule"]["2025-01-13"], "w1s1");
    assert_eq!(plan["selected_weekdays"], json!([0, 2]));
}

#[tokio::test]
#[ignore]
async fn test_replan_keeps_entries_before_from_date() {
    let client = Client::new();
    let (_, coach_token) = token_for(Role::Coach);
    let (athlete_id, athlete_token) = token_for(Role::Athlete);
    let plan_id = create_two_week_plan(&client, &coach_token, &athlete_id).await;

    let response = client
        .post(format!("{}/plans/{}/schedule", BASE_URL, plan_id))
        .bearer_auth(&athlete_token)
        .json(&json!({ "weekdays": [0, 2] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{}/plans/{}/replan", BASE_URL, plan_id))
        .bearer_auth(&athlete_token)
        .json(&json!({ "weekdays": [1, 3], "from_date": "2025-01-20" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse schedule");
    assert_eq!(body["schedule_status"], "active");

    let schedule = body["schedule"].as_object().expect("No schedule");
    assert_eq!(schedule.len(), 4);
    // Week one happened before from_date and stays put
    assert_eq!(schedule["2025-01-13"], "w1s1");
    assert_eq!(schedule["2025-01-15"], "w1s2");
    // Week two moves to Tuesday and Thursday
    assert_eq!(schedule["2025-01-21"], "w2s1");
    assert_eq!(schedule["2025-01-23"], "w2s2");
    assert!(!schedule.contains_key("2025-01-20"));
    assert!(!schedule.contains_key("2025-01-22"));
}

#[tokio::test]
#[ignore]
async fn test_concurrent_pauses_only_one_wins() {
    let client = Client::new();
    let (_, coach_token) = token_for(Role::Coach);
    let (athlete_id, athlete_token) = token_for(Role::Athlete);
    let plan_id = create_two_week_plan(&client, &coach_token, &athlete_id).await;

    let response = client
        .post(format!("{}/plans/{}/schedule", BASE_URL, plan_id))
        .bearer_auth(&athlete_token)
        .json(&json!({ "weekdays": [0, 2] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let pause = |weeks: i32| {
        client
            .post(format!("{}/plans/{}/pause", BASE_URL, plan_id))
            .bearer_auth(&athlete_token)
            .json(&json!({ "weeks": weeks }))
            .send()
    };
    let (first, second) = tokio::join!(pause(1), pause(2));
    let mut statuses = [
        first.expect("Failed to send request").status(),
        second.expect("Failed to send request").status(),
    ];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
}

#[tokio::test]
#[ignore]
async fn test_unknown_calendar_timezone_rejected() {
    let client = Client::new();
    let (_, token) = token_for(Role::Coach);

    let response = client
        .post(format!("{}/calendars", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": "Lunar", "timezone": "Moon/Base" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/calendars", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "name": "Paris", "timezone": "Europe/Paris" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let calendar: Value = response.json().await.expect("Failed to parse calendar");
    assert_eq!(calendar["timezone"], "Europe/Paris");
}
