use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::availability::AvailabilityRule;
use super::user::PublicUser;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulingType {
    RoundRobin,
    Collective,
}

impl SchedulingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingType::RoundRobin => "ROUND_ROBIN",
            SchedulingType::Collective => "COLLECTIVE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ROUND_ROBIN" | "roundRobin" => Some(SchedulingType::RoundRobin),
            "COLLECTIVE" | "collective" => Some(SchedulingType::Collective),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PeriodType {
    Unlimited,
    Rolling,
    Range,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Unlimited => "UNLIMITED",
            PeriodType::Rolling => "ROLLING",
            PeriodType::Range => "RANGE",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ROLLING" => PeriodType::Rolling,
            "RANGE" => PeriodType::Range,
            _ => PeriodType::Unlimited,
        }
    }
}

/// The slim shape listed on a user's booking page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub length: i32,
    pub description: Option<String>,
    pub hidden: bool,
    pub scheduling_type: Option<SchedulingType>,
    pub price: i64,
    pub currency: String,
}

/// Everything the booking page of a single event type needs.
///
/// `users` holds the public profiles of the people the event type is booked
/// with; for event types created under the single-owner scheme it is filled
/// in by the resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventType {
    pub id: i64,
    pub title: String,
    pub availability: Vec<AvailabilityRule>,
    pub description: Option<String>,
    pub length: i32,
    pub price: i64,
    pub currency: String,
    pub period_type: PeriodType,
    pub period_start_date: Option<DateTime<Utc>>,
    pub period_end_date: Option<DateTime<Utc>>,
    pub period_days: Option<i32>,
    pub period_count_calendar_days: Option<bool>,
    pub scheduling_type: Option<SchedulingType>,
    pub minimum_booking_notice: i32,
    pub users: Vec<PublicUser>,
}

/// Input for creating an event type. Either `user_id` (single-owner scheme)
/// or rows in `event_type_users` (member scheme) tie it to people.
#[derive(Debug, Clone)]
pub struct NewEventType {
    pub user_id: Option<i64>,
    pub team_id: Option<i64>,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub length: i32,
    pub hidden: bool,
    pub price: i64,
    pub currency: String,
    pub scheduling_type: Option<SchedulingType>,
    pub period_type: PeriodType,
    pub period_start_date: Option<DateTime<Utc>>,
    pub period_end_date: Option<DateTime<Utc>>,
    pub period_days: Option<i32>,
    pub period_count_calendar_days: Option<bool>,
    pub minimum_booking_notice: i32,
}

impl NewEventType {
    pub fn new(slug: &str, title: &str, length: i32) -> Self {
        Self {
            user_id: None,
            team_id: None,
            slug: slug.to_string(),
            title: title.to_string(),
            description: None,
            length,
            hidden: false,
            price: 0,
            currency: "usd".to_string(),
            scheduling_type: None,
            period_type: PeriodType::Unlimited,
            period_start_date: None,
            period_end_date: None,
            period_days: None,
            period_count_calendar_days: None,
            minimum_booking_notice: 120,
        }
    }
}
