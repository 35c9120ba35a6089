use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const ALL_WEEKDAYS: [u8; 7] = [0, 1, 2, 3, 4, 5, 6];
pub const MINUTES_PER_DAY: i32 = 1440;

/// A weekly window during which bookings may be made.
///
/// `days` are weekday numbers with Sunday as 0. Times are minutes from
/// midnight, so 09:00-17:00 is `540..1020`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRule {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub event_type_id: Option<i64>,
    pub days: Vec<u8>,
    pub start_time: i32,
    pub end_time: i32,
    pub date: Option<NaiveDate>,
}

impl AvailabilityRule {
    pub fn new(days: Vec<u8>, start_time: i32, end_time: i32) -> Self {
        Self {
            id: None,
            user_id: None,
            event_type_id: None,
            days,
            start_time,
            end_time,
            date: None,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for day in &self.days {
            parse_weekday(*day)?;
        }
        parse_minutes(self.start_time)?;
        parse_minutes(self.end_time)?;
        if self.end_time < self.start_time {
            return Err(anyhow::anyhow!(
                "window ends before it starts: {}-{}",
                self.start_time,
                self.end_time
            ));
        }
        Ok(())
    }
}

/// Decodes the JSON day list stored alongside a rule.
pub fn parse_days(s: &str) -> anyhow::Result<Vec<u8>> {
    let days: Vec<u8> = serde_json::from_str(s)?;
    for day in &days {
        parse_weekday(*day)?;
    }
    Ok(days)
}

fn parse_weekday(day: u8) -> anyhow::Result<()> {
    if ALL_WEEKDAYS.contains(&day) {
        Ok(())
    } else {
        Err(anyhow::anyhow!("invalid weekday: {day}"))
    }
}

fn parse_minutes(minutes: i32) -> anyhow::Result<()> {
    if (0..=MINUTES_PER_DAY).contains(&minutes) {
        Ok(())
    } else {
        Err(anyhow::anyhow!("time out of range: {minutes}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingHoursSource {
    EventType,
    User,
    Default,
}

#[derive(Debug, Clone)]
pub struct WorkingHours {
    pub source: WorkingHoursSource,
    pub rules: Vec<AvailabilityRule>,
}

impl WorkingHours {
    /// Picks the rules that govern a booking page, most specific first:
    /// the event type's own rules, then the owner's, then an every-day
    /// window built from the owner's default start and end time.
    ///
    /// The result is always sorted by start time.
    pub fn resolve(
        event_type_rules: &[AvailabilityRule],
        user_rules: &[AvailabilityRule],
        default_start: i32,
        default_end: i32,
    ) -> Self {
        let (source, mut rules) = if !event_type_rules.is_empty() {
            (WorkingHoursSource::EventType, event_type_rules.to_vec())
        } else if !user_rules.is_empty() {
            (WorkingHoursSource::User, user_rules.to_vec())
        } else {
            let fallback = vec![AvailabilityRule::new(
                ALL_WEEKDAYS.to_vec(),
                default_start,
                default_end,
            )];
            // Only keep the default window if it actually names days.
            let rules = fallback
                .into_iter()
                .filter(|rule| !rule.days.is_empty())
                .collect();
            (WorkingHoursSource::Default, rules)
        };

        rules.sort_by_key(|rule| rule.start_time);
        Self { source, rules }
    }
}
