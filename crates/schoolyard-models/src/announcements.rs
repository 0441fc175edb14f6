//! Announcements and school events.
//!
//! Each announcement targets an audience. Admins see everything; other roles
//! see announcements for everyone plus those for their own group.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use schoolyard_auth::UserRole;
use schoolyard_core::query::{deserialize_optional_bool, deserialize_optional_parsed};
use schoolyard_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "announcement_audience", rename_all = "snake_case")]
pub enum Audience {
    #[default]
    All,
    Teachers,
    Students,
    Parents,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::All => "all",
            Audience::Teachers => "teachers",
            Audience::Students => "students",
            Audience::Parents => "parents",
        }
    }

    /// Audiences a role may read. `None` means no restriction.
    pub fn visible_to(role: UserRole) -> Option<Vec<Audience>> {
        match role {
            UserRole::Admin => None,
            UserRole::Teacher => Some(vec![Audience::All, Audience::Teachers]),
            UserRole::Student => Some(vec![Audience::All, Audience::Students]),
            UserRole::Parent => Some(vec![Audience::All, Audience::Parents]),
        }
    }

    pub fn is_visible_to(&self, role: UserRole) -> bool {
        Audience::visible_to(role).is_none_or(|allowed| allowed.contains(self))
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Audience::All),
            "teachers" => Ok(Audience::Teachers),
            "students" => Ok(Audience::Students),
            "parents" => Ok(Audience::Parents),
            other => Err(format!("invalid audience: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub audience: Audience,
    pub event_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAnnouncementDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub body: String,
    #[serde(default)]
    pub audience: Audience,
    pub event_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAnnouncementDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub body: Option<String>,
    pub audience: Option<Audience>,
    pub event_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnnouncementFilterParams {
    /// Narrow to one audience (within what the caller may see)
    #[serde(default, deserialize_with = "deserialize_optional_parsed")]
    pub audience: Option<Audience>,
    /// Only events dated today or later
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub upcoming: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedAnnouncementsResponse {
    pub data: Vec<Announcement>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_sees_everything() {
        assert!(Audience::visible_to(UserRole::Admin).is_none());
        for audience in [
            Audience::All,
            Audience::Teachers,
            Audience::Students,
            Audience::Parents,
        ] {
            assert!(audience.is_visible_to(UserRole::Admin));
        }
    }

    #[test]
    fn test_roles_see_all_and_their_own_group() {
        assert!(Audience::All.is_visible_to(UserRole::Student));
        assert!(Audience::Students.is_visible_to(UserRole::Student));
        assert!(!Audience::Teachers.is_visible_to(UserRole::Student));
        assert!(!Audience::Parents.is_visible_to(UserRole::Student));

        assert!(Audience::Parents.is_visible_to(UserRole::Parent));
        assert!(!Audience::Students.is_visible_to(UserRole::Parent));

        assert!(Audience::Teachers.is_visible_to(UserRole::Teacher));
        assert!(!Audience::Parents.is_visible_to(UserRole::Teacher));
    }

    #[test]
    fn test_audience_defaults_to_all() {
        let dto: CreateAnnouncementDto =
            serde_json::from_str(r#"{"title":"Sports day","body":"Friday at 10am"}"#).unwrap();
        assert_eq!(dto.audience, Audience::All);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_filter_params_upcoming() {
        let params: AnnouncementFilterParams =
            serde_json::from_str(r#"{"upcoming":"true","audience":"parents"}"#).unwrap();
        assert_eq!(params.upcoming, Some(true));
        assert_eq!(params.audience, Some(Audience::Parents));
    }
}
