use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserPlan {
    Free,
    Trial,
    Pro,
}

impl UserPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserPlan::Free => "FREE",
            UserPlan::Trial => "TRIAL",
            UserPlan::Pro => "PRO",
        }
    }

    /// Unknown values fall back to `Pro`, matching the column default.
    pub fn parse(s: &str) -> Self {
        match s {
            "FREE" => UserPlan::Free,
            "TRIAL" => UserPlan::Trial,
            _ => UserPlan::Pro,
        }
    }

    /// How many personal event types a booking page may list on this plan.
    /// `None` means no cap.
    pub fn event_type_limit(&self) -> Option<usize> {
        match self {
            UserPlan::Free => Some(1),
            UserPlan::Trial | UserPlan::Pro => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub theme: Option<String>,
    pub plan: UserPlan,
    pub start_time: i32,
    pub end_time: i32,
    pub time_zone: String,
    pub week_start: String,
    pub hide_branding: bool,
}

impl User {
    pub fn public_profile(&self) -> PublicUser {
        PublicUser {
            avatar: self.avatar.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            hide_branding: self.hide_branding,
            plan: self.plan,
        }
    }
}

/// The fields of a user that are shown on somebody else's booking page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub avatar: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub hide_branding: bool,
    pub plan: UserPlan,
}
