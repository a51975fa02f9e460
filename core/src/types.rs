//! Wire types for the portfolio backend.
//!
//! # Design
//! These mirror the backend's JSON schema but are defined independently of
//! the mock server; the integration tests catch drift between the two.
//! Entities are read-only snapshots. Create payloads encode mandatory fields
//! as plain fields; update payloads make everything optional and omit unset
//! fields from the JSON so the backend leaves them untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

// ---------------------------------------------------------------------------
// Public site
// ---------------------------------------------------------------------------

/// Contact form submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

/// A stored contact message, as listed in the admin inbox.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsletterRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subscription {
    pub id: i64,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
    pub is_active: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Health {
    pub status: String,
    pub version: String,
    pub database: String,
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
}

/// One day of the views chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatPoint {
    pub day: String,
    pub views: u64,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserImage {
    pub id: i64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub images: Vec<UserImage>,
}

impl User {
    /// Name to greet the user with: full name when set, else the username.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }

    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(|image| image.image_url.as_str())
    }
}

/// Payload for creating a user. Username, email and password are mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_active() -> bool {
    true
}

impl CreateUserRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            role: Role::User,
            is_active: true,
            full_name: None,
            dob: None,
            images: Vec::new(),
        }
    }

    /// Reject blank mandatory fields before anything is sent.
    pub fn validate(&self) -> ApiResult<()> {
        require("username", &self.username)?;
        require("email", &self.email)?;
        require("password", &self.password)
    }
}

/// Payload for updating a user. A `None` field is left unchanged; `images`,
/// when present, replaces the whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl UpdateUserRequest {
    /// A blank password means "keep the current one".
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(username) = &self.username {
            require("username", username)?;
        }
        if let Some(email) = &self.email {
            require("email", email)?;
        }
        if matches!(&self.password, Some(p) if p.is_empty()) {
            return Err(ApiError::InvalidRequest(
                "password must be omitted rather than empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Split the editor's comma-separated image field into URLs, trimming each
/// entry and dropping blanks.
pub fn parse_image_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn require(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidRequest(format!("{field} is required")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePostRequest {
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdatePostRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Completed,
    InProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub project_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateProjectRequest {
    pub title: String,
    pub slug: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateProjectRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_tolerates_missing_optional_fields() {
        let user: User =
            serde_json::from_str(r#"{"id":1,"username":"hanni","email":"h@example.com"}"#).unwrap();
        assert_eq!(user.role, Role::User);
        assert!(user.dob.is_none());
        assert!(user.images.is_empty());
        assert_eq!(user.display_name(), "hanni");
    }

    #[test]
    fn user_parses_dob_and_images() {
        let user: User = serde_json::from_str(
            r#"{"id":2,"username":"minji","email":"m@example.com","role":"admin",
                "full_name":"Kim Minji","dob":"2004-05-07",
                "images":[{"id":9,"image_url":"https://cdn/x.jpg","created_at":"2024-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.dob, NaiveDate::from_ymd_opt(2004, 5, 7));
        assert_eq!(user.image_urls().collect::<Vec<_>>(), vec!["https://cdn/x.jpg"]);
        assert_eq!(user.display_name(), "Kim Minji");
    }

    #[test]
    fn create_user_requires_credentials() {
        assert!(CreateUserRequest::new("hanni", "h@example.com", "secret").validate().is_ok());

        let err = CreateUserRequest::new(" ", "h@example.com", "secret").validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid request: username is required");

        let err = CreateUserRequest::new("hanni", "", "secret").validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid request: email is required");

        let err = CreateUserRequest::new("hanni", "h@example.com", "").validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid request: password is required");
    }

    #[test]
    fn update_user_omits_unset_fields() {
        let update = UpdateUserRequest {
            full_name: Some("Pham Hanni".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, serde_json::json!({"full_name": "Pham Hanni"}));
    }

    #[test]
    fn update_user_rejects_empty_password() {
        let update = UpdateUserRequest {
            password: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn image_list_is_trimmed_and_compacted() {
        assert_eq!(
            parse_image_list(" a.jpg, ,b.jpg ,, c.jpg"),
            vec!["a.jpg", "b.jpg", "c.jpg"]
        );
        assert!(parse_image_list("").is_empty());
    }

    #[test]
    fn project_status_uses_kebab_case() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
        assert_eq!(json, r#""in-progress""#);
    }
}
