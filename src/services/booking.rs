use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::models::{
    AvailabilityRule, EventType, EventTypeSummary, PeriodType, PublicUser, SchedulingType, User,
    UserPlan, WorkingHours,
};

/// Per-request collaborators handed to the resolver.
pub struct RequestContext<'a> {
    pub conn: &'a Connection,
    pub locale: String,
}

impl<'a> RequestContext<'a> {
    pub fn new(conn: &'a Connection, locale: impl Into<String>) -> Self {
        Self {
            conn,
            locale: locale.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

// ── userEventTypes ──

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUser {
    pub id: i64,
    pub username: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub theme: Option<String>,
    pub plan: UserPlan,
}

impl From<&User> for BookingUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            bio: user.bio.clone(),
            avatar: user.avatar.clone(),
            theme: user.theme.clone(),
            plan: user.plan,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEventTypes {
    pub user: BookingUser,
    pub event_types: Vec<EventTypeSummary>,
}

/// Lists the event types shown on a user's booking page.
///
/// The plan cap is applied to the store's ordering before hidden entries are
/// dropped, so a free user whose first event type is hidden sees nothing.
pub fn user_event_types(
    ctx: &RequestContext<'_>,
    username: &str,
) -> Result<Option<UserEventTypes>, ResolveError> {
    require_username(username)?;

    let Some(user) = queries::get_user_by_username(ctx.conn, username)? else {
        tracing::debug!(username, "booking page user not found");
        return Ok(None);
    };

    let limit = user.plan.event_type_limit();
    let with_hidden = queries::list_personal_event_types(ctx.conn, user.id, limit)?;
    let total = with_hidden.len();

    let event_types: Vec<EventTypeSummary> =
        with_hidden.into_iter().filter(|e| !e.hidden).collect();

    tracing::debug!(
        user_id = user.id,
        plan = user.plan.as_str(),
        locale = %ctx.locale,
        total,
        visible = event_types.len(),
        "resolved user event types"
    );

    Ok(Some(UserEventTypes {
        user: BookingUser::from(&user),
        event_types,
    }))
}

// ── eventTypeByUsername ──

/// The two ways an event type can be tied to a user, tried in
/// [`OwnershipLookup::FALLBACK_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipLookup {
    /// The user is listed in `event_type_users`.
    Members,
    /// The event type's `user_id` column points at the user.
    LegacyOwner,
}

impl OwnershipLookup {
    pub const FALLBACK_ORDER: [OwnershipLookup; 2] =
        [OwnershipLookup::Members, OwnershipLookup::LegacyOwner];

    fn find(&self, conn: &Connection, user: &User, slug: &str) -> anyhow::Result<Option<EventType>> {
        match self {
            OwnershipLookup::Members => {
                let mut matches = queries::find_member_event_types_by_slug(conn, user.id, slug)?;
                if matches.len() == 1 {
                    Ok(matches.pop())
                } else {
                    if matches.len() > 1 {
                        tracing::warn!(
                            user_id = user.id,
                            slug,
                            count = matches.len(),
                            "ambiguous member event types, falling back to owner lookup"
                        );
                    }
                    Ok(None)
                }
            }
            OwnershipLookup::LegacyOwner => {
                let Some(mut event_type) = queries::find_owned_event_type_by_slug(conn, user.id, slug)?
                else {
                    return Ok(None);
                };
                // Single-owner rows have no members; present the owner the
                // same way member-scheme event types present theirs.
                event_type.users.push(user.public_profile());
                Ok(Some(event_type))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: Option<String>,
    pub image: Option<String>,
    pub slug: Option<String>,
    pub theme: Option<String>,
    pub week_start: String,
}

/// An [`EventType`] with its period boundaries rendered as strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeView {
    pub id: i64,
    pub title: String,
    pub availability: Vec<AvailabilityRule>,
    pub description: Option<String>,
    pub length: i32,
    pub price: i64,
    pub currency: String,
    pub period_type: PeriodType,
    pub period_start_date: Option<String>,
    pub period_end_date: Option<String>,
    pub period_days: Option<i32>,
    pub period_count_calendar_days: Option<bool>,
    pub scheduling_type: Option<SchedulingType>,
    pub minimum_booking_notice: i32,
    pub users: Vec<PublicUser>,
}

impl From<EventType> for EventTypeView {
    fn from(e: EventType) -> Self {
        Self {
            id: e.id,
            title: e.title,
            availability: e.availability,
            description: e.description,
            length: e.length,
            price: e.price,
            currency: e.currency,
            period_type: e.period_type,
            period_start_date: e.period_start_date.map(|d| d.to_rfc3339()),
            period_end_date: e.period_end_date.map(|d| d.to_rfc3339()),
            period_days: e.period_days,
            period_count_calendar_days: e.period_count_calendar_days,
            scheduling_type: e.scheduling_type,
            minimum_booking_notice: e.minimum_booking_notice,
            users: e.users,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypePage {
    pub profile: Profile,
    pub event_type: EventTypeView,
    pub working_hours: Vec<AvailabilityRule>,
}

/// Resolves the booking page for `username`/`slug`.
///
/// `date` is accepted for the client's benefit and does not affect the result.
pub fn event_type_by_username(
    ctx: &RequestContext<'_>,
    username: &str,
    slug: &str,
    date: Option<&str>,
) -> Result<Option<EventTypePage>, ResolveError> {
    require_username(username)?;

    let Some(user) = queries::get_user_by_username(ctx.conn, username)? else {
        tracing::debug!(username, slug, "booking page user not found");
        return Ok(None);
    };

    let mut resolved = None;
    for lookup in OwnershipLookup::FALLBACK_ORDER {
        if let Some(event_type) = lookup.find(ctx.conn, &user, slug)? {
            tracing::debug!(
                user_id = user.id,
                slug,
                ?lookup,
                date,
                locale = %ctx.locale,
                "event type resolved"
            );
            resolved = Some(event_type);
            break;
        }
    }
    let Some(event_type) = resolved else {
        tracing::debug!(user_id = user.id, slug, "event type not found");
        return Ok(None);
    };

    let user_rules = queries::get_user_availability(ctx.conn, user.id)?;
    let working_hours = WorkingHours::resolve(
        &event_type.availability,
        &user_rules,
        user.start_time,
        user.end_time,
    );
    tracing::debug!(
        event_type_id = event_type.id,
        source = ?working_hours.source,
        rules = working_hours.rules.len(),
        "working hours resolved"
    );

    Ok(Some(EventTypePage {
        profile: Profile {
            name: user.name,
            image: user.avatar,
            slug: user.username,
            theme: user.theme,
            week_start: user.week_start,
        },
        event_type: EventTypeView::from(event_type),
        working_hours: working_hours.rules,
    }))
}

fn require_username(username: &str) -> Result<(), ResolveError> {
    if username.is_empty() {
        return Err(ResolveError::InvalidInput("username must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{NewEventType, WorkingHoursSource};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn make_user(conn: &Connection, username: &str, plan: UserPlan) -> i64 {
        let user = User {
            id: 0,
            username: Some(username.to_string()),
            email: format!("{username}@example.com"),
            name: Some(format!("{username} name")),
            bio: Some("bio".to_string()),
            avatar: Some(format!("https://img.example.com/{username}.png")),
            theme: Some("dark".to_string()),
            plan,
            start_time: 540,
            end_time: 1020,
            time_zone: "Europe/London".to_string(),
            week_start: "Monday".to_string(),
            hide_branding: true,
        };
        queries::insert_user(conn, &user).unwrap()
    }

    fn owned(conn: &Connection, user_id: i64, slug: &str, hidden: bool) -> i64 {
        queries::insert_event_type(
            conn,
            &NewEventType {
                user_id: Some(user_id),
                hidden,
                ..NewEventType::new(slug, slug, 30)
            },
        )
        .unwrap()
    }

    fn member(conn: &Connection, user_id: i64, slug: &str) -> i64 {
        let id = queries::insert_event_type(conn, &NewEventType::new(slug, slug, 30)).unwrap();
        queries::add_event_type_member(conn, id, user_id).unwrap();
        id
    }

    fn rule(owner_user: Option<i64>, event_type: Option<i64>, start: i32, end: i32) -> AvailabilityRule {
        AvailabilityRule {
            user_id: owner_user,
            event_type_id: event_type,
            ..AvailabilityRule::new(vec![1, 2, 3], start, end)
        }
    }

    #[test]
    fn test_unknown_username_is_none() {
        let conn = setup_db();
        let ctx = RequestContext::new(&conn, "en");
        assert!(user_event_types(&ctx, "nobody").unwrap().is_none());
        assert!(event_type_by_username(&ctx, "nobody", "intro", None).unwrap().is_none());
    }

    #[test]
    fn test_empty_username_is_rejected() {
        let conn = setup_db();
        let ctx = RequestContext::new(&conn, "en");
        assert!(matches!(
            user_event_types(&ctx, ""),
            Err(ResolveError::InvalidInput(_))
        ));
        assert!(matches!(
            event_type_by_username(&ctx, "", "intro", None),
            Err(ResolveError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_free_plan_sees_only_first_event_type() {
        let conn = setup_db();
        let user_id = make_user(&conn, "free", UserPlan::Free);
        let first = owned(&conn, user_id, "first", false);
        owned(&conn, user_id, "second", false);
        member(&conn, user_id, "third");

        let ctx = RequestContext::new(&conn, "en");
        let result = user_event_types(&ctx, "FREE").unwrap().unwrap();
        assert_eq!(result.event_types.len(), 1);
        assert_eq!(result.event_types[0].id, first);
        assert_eq!(result.user.plan, UserPlan::Free);
    }

    #[test]
    fn test_free_plan_cap_applies_before_hidden_filter() {
        let conn = setup_db();
        let user_id = make_user(&conn, "free", UserPlan::Free);
        owned(&conn, user_id, "first", true);
        owned(&conn, user_id, "second", false);

        let ctx = RequestContext::new(&conn, "en");
        let result = user_event_types(&ctx, "free").unwrap().unwrap();
        assert!(result.event_types.is_empty());
    }

    #[test]
    fn test_paid_plan_sees_all_visible_in_order() {
        let conn = setup_db();
        let user_id = make_user(&conn, "pro", UserPlan::Pro);
        let a = owned(&conn, user_id, "a", false);
        owned(&conn, user_id, "b", true);
        let c = member(&conn, user_id, "c");

        let ctx = RequestContext::new(&conn, "en");
        let result = user_event_types(&ctx, "pro").unwrap().unwrap();
        let ids: Vec<i64> = result.event_types.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn test_member_event_type_is_used_directly() {
        let conn = setup_db();
        let user_id = make_user(&conn, "alice", UserPlan::Pro);
        let id = member(&conn, user_id, "intro");

        let ctx = RequestContext::new(&conn, "en");
        let page = event_type_by_username(&ctx, "alice", "intro", None).unwrap().unwrap();
        assert_eq!(page.event_type.id, id);
        assert_eq!(page.event_type.users.len(), 1);
        assert_eq!(page.profile.slug.as_deref(), Some("alice"));
        assert_eq!(page.profile.week_start, "Monday");
    }

    #[test]
    fn test_legacy_owner_fallback_synthesizes_users() {
        let conn = setup_db();
        let user_id = make_user(&conn, "legacy", UserPlan::Trial);
        let id = owned(&conn, user_id, "intro", false);

        let ctx = RequestContext::new(&conn, "en");
        let page = event_type_by_username(&ctx, "Legacy", "intro", Some("2025-06"))
            .unwrap()
            .unwrap();
        assert_eq!(page.event_type.id, id);
        assert_eq!(
            page.event_type.users,
            vec![PublicUser {
                avatar: Some("https://img.example.com/legacy.png".to_string()),
                name: Some("legacy name".to_string()),
                username: Some("legacy".to_string()),
                hide_branding: true,
                plan: UserPlan::Trial,
            }]
        );
    }

    #[test]
    fn test_missing_slug_is_none() {
        let conn = setup_db();
        let user_id = make_user(&conn, "alice", UserPlan::Pro);
        owned(&conn, user_id, "intro", false);

        let ctx = RequestContext::new(&conn, "en");
        assert!(event_type_by_username(&ctx, "alice", "other", None).unwrap().is_none());
    }

    #[test]
    fn test_event_type_availability_wins_and_is_sorted() {
        let conn = setup_db();
        let user_id = make_user(&conn, "alice", UserPlan::Pro);
        let id = owned(&conn, user_id, "intro", false);
        queries::insert_availability(&conn, &rule(None, Some(id), 840, 960)).unwrap();
        queries::insert_availability(&conn, &rule(None, Some(id), 540, 720)).unwrap();
        queries::insert_availability(&conn, &rule(Some(user_id), None, 60, 120)).unwrap();

        let ctx = RequestContext::new(&conn, "en");
        let page = event_type_by_username(&ctx, "alice", "intro", None).unwrap().unwrap();
        let starts: Vec<i32> = page.working_hours.iter().map(|r| r.start_time).collect();
        assert_eq!(starts, vec![540, 840]);
    }

    #[test]
    fn test_user_availability_used_without_event_type_rules() {
        let conn = setup_db();
        let user_id = make_user(&conn, "alice", UserPlan::Pro);
        owned(&conn, user_id, "intro", false);
        queries::insert_availability(&conn, &rule(Some(user_id), None, 600, 660)).unwrap();

        let ctx = RequestContext::new(&conn, "en");
        let page = event_type_by_username(&ctx, "alice", "intro", None).unwrap().unwrap();
        assert_eq!(page.working_hours.len(), 1);
        assert_eq!(page.working_hours[0].start_time, 600);
    }

    #[test]
    fn test_default_working_hours_from_user_times() {
        let conn = setup_db();
        let user_id = make_user(&conn, "alice", UserPlan::Pro);
        owned(&conn, user_id, "intro", false);

        let user = queries::get_user_by_username(&conn, "alice").unwrap().unwrap();
        let expected = WorkingHours::resolve(&[], &[], user.start_time, user.end_time);
        assert_eq!(expected.source, WorkingHoursSource::Default);

        let ctx = RequestContext::new(&conn, "en");
        let page = event_type_by_username(&ctx, "alice", "intro", None).unwrap().unwrap();
        assert_eq!(page.working_hours, expected.rules);
        assert_eq!(page.working_hours[0].days, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(page.working_hours[0].start_time, 540);
        assert_eq!(page.working_hours[0].end_time, 1020);
    }

    #[test]
    fn test_period_dates_rendered_as_strings() {
        let conn = setup_db();
        let user_id = make_user(&conn, "alice", UserPlan::Pro);
        let start = chrono::DateTime::parse_from_rfc3339("2025-06-16T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        queries::insert_event_type(
            &conn,
            &NewEventType {
                user_id: Some(user_id),
                period_type: PeriodType::Range,
                period_start_date: Some(start),
                ..NewEventType::new("ranged", "Ranged", 30)
            },
        )
        .unwrap();

        let ctx = RequestContext::new(&conn, "en");
        let page = event_type_by_username(&ctx, "alice", "ranged", None).unwrap().unwrap();
        assert_eq!(
            page.event_type.period_start_date.as_deref(),
            Some("2025-06-16T00:00:00+00:00")
        );
        assert_eq!(page.event_type.period_end_date, None);
    }

    #[test]
    fn test_ambiguous_member_slug_falls_back_to_owner() {
        let conn = setup_db();
        let user_id = make_user(&conn, "alice", UserPlan::Pro);
        member(&conn, user_id, "intro");
        member(&conn, user_id, "intro");

        let ctx = RequestContext::new(&conn, "en");
        assert!(event_type_by_username(&ctx, "alice", "intro", None).unwrap().is_none());

        let legacy = owned(&conn, user_id, "intro", false);
        let page = event_type_by_username(&ctx, "alice", "intro", None).unwrap().unwrap();
        assert_eq!(page.event_type.id, legacy);
        assert_eq!(page.event_type.users.len(), 1);
        assert_eq!(page.event_type.users[0].username.as_deref(), Some("alice"));
    }
}
