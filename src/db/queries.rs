use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::availability::parse_days;
use crate::models::{
    AvailabilityRule, Credential, EventType, EventTypeSummary, NewEventType, PeriodType,
    PublicUser, SchedulingType, User, UserPlan,
};

const EVENT_TYPE_COLUMNS: &str = "e.id, e.title, e.description, e.length, e.price, e.currency, \
     e.period_type, e.period_start_date, e.period_end_date, e.period_days, \
     e.period_count_calendar_days, e.scheduling_type, e.minimum_booking_notice";

// ── Users ──

pub fn insert_user(conn: &Connection, user: &User) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO users (username, email, name, bio, avatar, theme, plan, start_time, end_time, time_zone, week_start, hide_branding)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            user.username.as_deref().map(str::to_lowercase),
            user.email,
            user.name,
            user.bio,
            user.avatar,
            user.theme,
            user.plan.as_str(),
            user.start_time,
            user.end_time,
            user.time_zone,
            user.week_start,
            user.hide_branding,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Usernames are stored lowercased, so the lookup folds the input the same way.
pub fn get_user_by_username(conn: &Connection, username: &str) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, email, name, bio, avatar, theme, plan, start_time, end_time, time_zone, week_start, hide_branding
             FROM users WHERE username = ?1",
            params![username.to_lowercase()],
            |row| {
                let plan: String = row.get(7)?;
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                    name: row.get(3)?,
                    bio: row.get(4)?,
                    avatar: row.get(5)?,
                    theme: row.get(6)?,
                    plan: UserPlan::parse(&plan),
                    start_time: row.get(8)?,
                    end_time: row.get(9)?,
                    time_zone: row.get(10)?,
                    week_start: row.get(11)?,
                    hide_branding: row.get(12)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

// ── Event types ──

pub fn insert_event_type(conn: &Connection, event_type: &NewEventType) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO event_types (user_id, team_id, slug, title, description, length, hidden, price, currency,
            scheduling_type, period_type, period_start_date, period_end_date, period_days,
            period_count_calendar_days, minimum_booking_notice)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            event_type.user_id,
            event_type.team_id,
            event_type.slug,
            event_type.title,
            event_type.description,
            event_type.length,
            event_type.hidden,
            event_type.price,
            event_type.currency,
            event_type.scheduling_type.map(|s| s.as_str()),
            event_type.period_type.as_str(),
            event_type.period_start_date.map(|d| d.to_rfc3339()),
            event_type.period_end_date.map(|d| d.to_rfc3339()),
            event_type.period_days,
            event_type.period_count_calendar_days,
            event_type.minimum_booking_notice,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn add_event_type_member(
    conn: &Connection,
    event_type_id: i64,
    user_id: i64,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO event_type_users (event_type_id, user_id) VALUES (?1, ?2)",
        params![event_type_id, user_id],
    )?;
    Ok(())
}

pub fn insert_team(conn: &Connection, name: &str, slug: &str) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO teams (name, slug) VALUES (?1, ?2)",
        params![name, slug],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Personal (non-team) event types a user owns directly or is a member of,
/// in id order, capped at `limit` when given. Hidden ones are included.
pub fn list_personal_event_types(
    conn: &Connection,
    user_id: i64,
    limit: Option<usize>,
) -> anyhow::Result<Vec<EventTypeSummary>> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit = limit.map(|n| n as i64).unwrap_or(-1);

    let mut stmt = conn.prepare(
        "SELECT e.id, e.slug, e.title, e.length, e.description, e.hidden, e.scheduling_type, e.price, e.currency
         FROM event_types e
         WHERE e.team_id IS NULL
           AND (e.user_id = ?1
                OR EXISTS (SELECT 1 FROM event_type_users m WHERE m.event_type_id = e.id AND m.user_id = ?1))
         ORDER BY e.id ASC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![user_id, limit], |row| {
        let scheduling_type: Option<String> = row.get(6)?;
        Ok(EventTypeSummary {
            id: row.get(0)?,
            slug: row.get(1)?,
            title: row.get(2)?,
            length: row.get(3)?,
            description: row.get(4)?,
            hidden: row.get(5)?,
            scheduling_type: scheduling_type.as_deref().and_then(SchedulingType::parse),
            price: row.get(7)?,
            currency: row.get(8)?,
        })
    })?;

    let mut event_types = vec![];
    for row in rows {
        event_types.push(row?);
    }
    Ok(event_types)
}

/// Non-team event types with `slug` that list the user in `event_type_users`.
pub fn find_member_event_types_by_slug(
    conn: &Connection,
    user_id: i64,
    slug: &str,
) -> anyhow::Result<Vec<EventType>> {
    let sql = format!(
        "SELECT {EVENT_TYPE_COLUMNS}
         FROM event_types e
         JOIN event_type_users m ON m.event_type_id = e.id
         WHERE m.user_id = ?1 AND e.slug = ?2 AND e.team_id IS NULL
         ORDER BY e.id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id, slug], |row| Ok(parse_event_type_row(row)))?;

    let mut event_types = vec![];
    for row in rows {
        let mut event_type = row??;
        load_event_type_relations(conn, &mut event_type)?;
        event_types.push(event_type);
    }
    Ok(event_types)
}

/// First event type with `slug` whose single-owner column points at the user.
pub fn find_owned_event_type_by_slug(
    conn: &Connection,
    user_id: i64,
    slug: &str,
) -> anyhow::Result<Option<EventType>> {
    let sql = format!(
        "SELECT {EVENT_TYPE_COLUMNS}
         FROM event_types e
         WHERE e.user_id = ?1 AND e.slug = ?2
         ORDER BY e.id ASC
         LIMIT 1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![user_id, slug], |row| Ok(parse_event_type_row(row)))?;

    match rows.next() {
        Some(row) => {
            let mut event_type = row??;
            load_event_type_relations(conn, &mut event_type)?;
            Ok(Some(event_type))
        }
        None => Ok(None),
    }
}

pub fn get_event_type_users(conn: &Connection, event_type_id: i64) -> anyhow::Result<Vec<PublicUser>> {
    let mut stmt = conn.prepare(
        "SELECT u.avatar, u.name, u.username, u.hide_branding, u.plan
         FROM users u
         JOIN event_type_users m ON m.user_id = u.id
         WHERE m.event_type_id = ?1
         ORDER BY u.id ASC",
    )?;

    let rows = stmt.query_map(params![event_type_id], |row| {
        let plan: String = row.get(4)?;
        Ok(PublicUser {
            avatar: row.get(0)?,
            name: row.get(1)?,
            username: row.get(2)?,
            hide_branding: row.get(3)?,
            plan: UserPlan::parse(&plan),
        })
    })?;

    let mut users = vec![];
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

fn load_event_type_relations(conn: &Connection, event_type: &mut EventType) -> anyhow::Result<()> {
    event_type.availability = get_event_type_availability(conn, event_type.id)?;
    event_type.users = get_event_type_users(conn, event_type.id)?;
    Ok(())
}

fn parse_event_type_row(row: &rusqlite::Row) -> anyhow::Result<EventType> {
    let period_type: String = row.get(6)?;
    let period_start_date: Option<String> = row.get(7)?;
    let period_end_date: Option<String> = row.get(8)?;
    let scheduling_type: Option<String> = row.get(11)?;

    Ok(EventType {
        id: row.get(0)?,
        title: row.get(1)?,
        availability: vec![],
        description: row.get(2)?,
        length: row.get(3)?,
        price: row.get(4)?,
        currency: row.get(5)?,
        period_type: PeriodType::parse(&period_type),
        period_start_date: parse_timestamp(period_start_date.as_deref())?,
        period_end_date: parse_timestamp(period_end_date.as_deref())?,
        period_days: row.get(9)?,
        period_count_calendar_days: row.get(10)?,
        scheduling_type: scheduling_type.as_deref().and_then(SchedulingType::parse),
        minimum_booking_notice: row.get(12)?,
        users: vec![],
    })
}

/// Accepts RFC 3339 as written by this module, or SQLite's
/// `datetime()` format for rows written by hand.
fn parse_timestamp(value: Option<&str>) -> anyhow::Result<Option<DateTime<Utc>>> {
    let Some(value) = value else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| anyhow::anyhow!("invalid timestamp {value:?}: {e}"))?;
    Ok(Some(naive.and_utc()))
}

// ── Availability ──

pub fn insert_availability(conn: &Connection, rule: &AvailabilityRule) -> anyhow::Result<i64> {
    rule.validate()?;
    conn.execute(
        "INSERT INTO availability (user_id, event_type_id, days, start_time, end_time, date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            rule.user_id,
            rule.event_type_id,
            serde_json::to_string(&rule.days)?,
            rule.start_time,
            rule.end_time,
            rule.date.map(|d| d.format("%Y-%m-%d").to_string()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user_availability(conn: &Connection, user_id: i64) -> anyhow::Result<Vec<AvailabilityRule>> {
    query_availability(
        conn,
        "SELECT id, user_id, event_type_id, days, start_time, end_time, date
         FROM availability WHERE user_id = ?1 ORDER BY id ASC",
        user_id,
    )
}

pub fn get_event_type_availability(
    conn: &Connection,
    event_type_id: i64,
) -> anyhow::Result<Vec<AvailabilityRule>> {
    query_availability(
        conn,
        "SELECT id, user_id, event_type_id, days, start_time, end_time, date
         FROM availability WHERE event_type_id = ?1 ORDER BY id ASC",
        event_type_id,
    )
}

fn query_availability(conn: &Connection, sql: &str, owner_id: i64) -> anyhow::Result<Vec<AvailabilityRule>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![owner_id], |row| Ok(parse_availability_row(row)))?;

    let mut rules = vec![];
    for row in rows {
        rules.push(row??);
    }
    Ok(rules)
}

fn parse_availability_row(row: &rusqlite::Row) -> anyhow::Result<AvailabilityRule> {
    let days: String = row.get(3)?;
    let date: Option<String> = row.get(6)?;
    let date = match date {
        Some(d) => Some(NaiveDate::parse_from_str(&d, "%Y-%m-%d")?),
        None => None,
    };

    Ok(AvailabilityRule {
        id: row.get(0)?,
        user_id: row.get(1)?,
        event_type_id: row.get(2)?,
        days: parse_days(&days)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        date,
    })
}

// ── Credentials ──

pub fn insert_credential(
    conn: &Connection,
    kind: &str,
    key: &serde_json::Value,
    user_id: i64,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO credentials (type, key, user_id) VALUES (?1, ?2, ?3)",
        params![kind, serde_json::to_string(key)?, user_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_credentials(conn: &Connection, user_id: i64) -> anyhow::Result<Vec<Credential>> {
    let mut stmt = conn.prepare(
        "SELECT id, type, key, user_id FROM credentials WHERE user_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<i64>>(3)?,
        ))
    })?;

    let mut credentials = vec![];
    for row in rows {
        let (id, kind, key, user_id) = row?;
        let key = match serde_json::from_str(&key) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(credential_id = id, error = %e, "credential key is not valid JSON");
                serde_json::Value::Null
            }
        };
        credentials.push(Credential {
            id,
            kind,
            key,
            user_id,
        });
    }
    Ok(credentials)
}

/// Deletes a credential only if `user_id` owns it. Returns whether a row went away.
pub fn delete_credential(conn: &Connection, id: i64, user_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM credentials WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(count > 0)
}
