pub mod availability;
pub mod credential;
pub mod event_type;
pub mod user;

pub use availability::{AvailabilityRule, WorkingHours, WorkingHoursSource};
pub use credential::Credential;
pub use event_type::{EventType, EventTypeSummary, NewEventType, PeriodType, SchedulingType};
pub use user::{PublicUser, User, UserPlan};
