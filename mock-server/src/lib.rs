//! In-memory stand-in for the portfolio backend.
//!
//! Mirrors the real service's routes and response conventions: JSON bodies,
//! `{"detail": ...}` on errors, 201 on create, 204 on user/post/project
//! delete, 200 with a message on contact delete.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ContactCreate {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: i64,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
    pub is_active: i32,
}

#[derive(Deserialize)]
pub struct NewsletterCreate {
    pub email: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserImage {
    pub id: i64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub full_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub images: Vec<UserImage>,
}

#[derive(Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub full_name: Option<String>,
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub full_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub images: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: String,
    pub views: i64,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct PostCreate {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(default = "default_post_status")]
    pub status: String,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
    pub github_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct ProjectCreate {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
    pub github_url: Option<String>,
    #[serde(default = "default_project_status")]
    pub status: String,
}

#[derive(Deserialize)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
    pub github_url: Option<String>,
    pub status: Option<String>,
}

fn default_role() -> String {
    "user".to_string()
}

fn default_true() -> bool {
    true
}

fn default_post_status() -> String {
    "draft".to_string()
}

fn default_project_status() -> String {
    "completed".to_string()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Incorrect username or password")]
    Unauthorized,

    #[error("{0}")]
    Unprocessable(String),
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = match self {
            BackendError::NotFound(_) => StatusCode::NOT_FOUND,
            BackendError::BadRequest(_) => StatusCode::BAD_REQUEST,
            BackendError::Unauthorized => StatusCode::UNAUTHORIZED,
            BackendError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

type Result<T> = std::result::Result<T, BackendError>;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Admin credentials accepted by `/api/admin/login`.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        }
    }
}

pub const LOGIN_TOKEN: &str = "fake-jwt-token-for-demo";
pub const VERSION: &str = "1.0.0";

const WEEKLY_STATS: [(&str, u64); 7] = [
    ("Mon", 120),
    ("Tue", 150),
    ("Wed", 180),
    ("Thu", 190),
    ("Fri", 250),
    ("Sat", 300),
    ("Sun", 280),
];

#[derive(Default)]
pub struct Store {
    next_id: i64,
    contacts: BTreeMap<i64, Contact>,
    subscribers: BTreeMap<i64, Subscriber>,
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    projects: BTreeMap<i64, Project>,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<RwLock<Store>>,
    credentials: Arc<Credentials>,
}

pub fn app() -> Router {
    app_with(Credentials::default())
}

pub fn app_with(credentials: Credentials) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        credentials: Arc::new(credentials),
    };
    Router::new()
        .route("/api/health", get(health))
        .route("/api/contact/", post(create_contact))
        .route("/api/newsletter/subscribe", post(subscribe))
        .route("/api/admin/login", post(login))
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/contacts", get(list_contacts))
        .route("/api/admin/contacts/{id}", delete(delete_contact))
        .route("/api/users/", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/content/posts", get(list_posts).post(create_post))
        .route(
            "/api/content/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/content/projects", get(list_projects).post(create_project))
        .route(
            "/api/content/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> std::result::Result<(), std::io::Error> {
    run_with(listener, Credentials::default()).await
}

pub async fn run_with(
    listener: TcpListener,
    credentials: Credentials,
) -> std::result::Result<(), std::io::Error> {
    axum::serve(listener, app_with(credentials)).await
}

// ---------------------------------------------------------------------------
// Public site
// ---------------------------------------------------------------------------

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "version": VERSION, "database": "connected" }))
}

async fn create_contact(
    State(state): State<AppState>,
    Json(input): Json<ContactCreate>,
) -> Result<(StatusCode, Json<Contact>)> {
    check_len("name", &input.name, 2, 100)?;
    check_email(&input.email)?;
    check_len("subject", &input.subject, 3, 200)?;
    check_len("message", &input.message, 10, 2000)?;

    let mut db = state.db.write().await;
    let contact = Contact {
        id: db.next_id(),
        name: input.name,
        email: input.email,
        subject: input.subject,
        message: input.message,
        created_at: Utc::now(),
    };
    db.contacts.insert(contact.id, contact.clone());
    info!(id = contact.id, "contact stored");
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn subscribe(
    State(state): State<AppState>,
    Json(input): Json<NewsletterCreate>,
) -> Result<(StatusCode, Json<Subscriber>)> {
    check_email(&input.email)?;

    let mut db = state.db.write().await;
    if let Some(existing) = db.subscribers.values_mut().find(|s| s.email == input.email) {
        if existing.is_active == 1 {
            return Err(BackendError::BadRequest(
                "Email is already subscribed to newsletter".to_string(),
            ));
        }
        existing.is_active = 1;
        return Ok((StatusCode::CREATED, Json(existing.clone())));
    }
    let subscriber = Subscriber {
        id: db.next_id(),
        email: input.email,
        subscribed_at: Utc::now(),
        is_active: 1,
    };
    db.subscribers.insert(subscriber.id, subscriber.clone());
    Ok((StatusCode::CREATED, Json(subscriber)))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

async fn login(State(state): State<AppState>, Json(input): Json<LoginRequest>) -> Result<Json<Value>> {
    if input.username == state.credentials.username && input.password == state.credentials.password {
        return Ok(Json(json!({ "token": LOGIN_TOKEN, "message": "Login successful" })));
    }
    Err(BackendError::Unauthorized)
}

async fn stats() -> Json<Value> {
    let points: Vec<Value> = WEEKLY_STATS
        .iter()
        .map(|(day, views)| json!({ "day": day, "views": views }))
        .collect();
    Json(Value::Array(points))
}

/// Newest first.
async fn list_contacts(State(state): State<AppState>) -> Json<Vec<Contact>> {
    let db = state.db.read().await;
    Json(db.contacts.values().rev().cloned().collect())
}

async fn delete_contact(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>> {
    let mut db = state.db.write().await;
    db.contacts
        .remove(&id)
        .ok_or_else(|| BackendError::NotFound(format!("Contact with id {id} not found")))?;
    Ok(Json(json!({ "message": "Contact deleted successfully" })))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

const USER_NOT_FOUND: &str = "User not found";

async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    let db = state.db.read().await;
    Json(db.users.values().cloned().collect())
}

async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<User>> {
    let db = state.db.read().await;
    db.users
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| BackendError::NotFound(USER_NOT_FOUND.to_string()))
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<UserCreate>,
) -> Result<(StatusCode, Json<User>)> {
    check_len("password", &input.password, 1, 255)?;
    check_email(&input.email)?;

    let mut db = state.db.write().await;
    if db
        .users
        .values()
        .any(|u| u.username == input.username || u.email == input.email)
    {
        return Err(BackendError::BadRequest(
            "Username or email already registered".to_string(),
        ));
    }
    let id = db.next_id();
    let images = input.images.into_iter().map(|url| image(&mut db, url)).collect();
    let user = User {
        id,
        username: input.username,
        email: input.email,
        role: input.role,
        is_active: input.is_active,
        full_name: input.full_name,
        dob: input.dob,
        images,
    };
    db.users.insert(id, user.clone());
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UserUpdate>,
) -> Result<Json<User>> {
    let mut db = state.db.write().await;
    let images = input
        .images
        .map(|urls| urls.into_iter().map(|url| image(&mut db, url)).collect::<Vec<_>>());
    let user = db
        .users
        .get_mut(&id)
        .ok_or_else(|| BackendError::NotFound(USER_NOT_FOUND.to_string()))?;
    if let Some(username) = input.username {
        user.username = username;
    }
    if let Some(email) = input.email {
        user.email = email;
    }
    if let Some(role) = input.role {
        user.role = role;
    }
    if let Some(is_active) = input.is_active {
        user.is_active = is_active;
    }
    if input.full_name.is_some() {
        user.full_name = input.full_name;
    }
    if input.dob.is_some() {
        user.dob = input.dob;
    }
    if let Some(images) = images {
        user.images = images;
    }
    Ok(Json(user.clone()))
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    let mut db = state.db.write().await;
    db.users
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| BackendError::NotFound(USER_NOT_FOUND.to_string()))
}

fn image(db: &mut Store, image_url: String) -> UserImage {
    UserImage {
        id: db.next_id(),
        image_url,
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

const POST_NOT_FOUND: &str = "Post not found";

async fn list_posts(State(state): State<AppState>) -> Json<Vec<Post>> {
    let db = state.db.read().await;
    Json(db.posts.values().cloned().collect())
}

async fn get_post(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Post>> {
    let db = state.db.read().await;
    db.posts
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| BackendError::NotFound(POST_NOT_FOUND.to_string()))
}

async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<PostCreate>,
) -> Result<(StatusCode, Json<Post>)> {
    let mut db = state.db.write().await;
    if db.posts.values().any(|p| p.slug == input.slug) {
        return Err(BackendError::BadRequest("Slug already exists".to_string()));
    }
    let post = Post {
        id: db.next_id(),
        title: input.title,
        slug: input.slug,
        content: input.content,
        excerpt: input.excerpt,
        status: input.status,
        views: 0,
        image_url: input.image_url,
        category_id: input.category_id,
        created_at: Utc::now(),
        updated_at: None,
    };
    db.posts.insert(post.id, post.clone());
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<PostUpdate>,
) -> Result<Json<Post>> {
    let mut db = state.db.write().await;
    let post = db
        .posts
        .get_mut(&id)
        .ok_or_else(|| BackendError::NotFound(POST_NOT_FOUND.to_string()))?;
    if let Some(title) = input.title {
        post.title = title;
    }
    if let Some(slug) = input.slug {
        post.slug = slug;
    }
    if let Some(content) = input.content {
        post.content = content;
    }
    if let Some(status) = input.status {
        post.status = status;
    }
    if input.excerpt.is_some() {
        post.excerpt = input.excerpt;
    }
    if input.image_url.is_some() {
        post.image_url = input.image_url;
    }
    if input.category_id.is_some() {
        post.category_id = input.category_id;
    }
    post.updated_at = Some(Utc::now());
    Ok(Json(post.clone()))
}

async fn delete_post(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    let mut db = state.db.write().await;
    db.posts
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| BackendError::NotFound(POST_NOT_FOUND.to_string()))
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

const PROJECT_NOT_FOUND: &str = "Project not found";

async fn list_projects(State(state): State<AppState>) -> Json<Vec<Project>> {
    let db = state.db.read().await;
    Json(db.projects.values().cloned().collect())
}

async fn get_project(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Project>> {
    let db = state.db.read().await;
    db.projects
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| BackendError::NotFound(PROJECT_NOT_FOUND.to_string()))
}

async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<ProjectCreate>,
) -> Result<(StatusCode, Json<Project>)> {
    let mut db = state.db.write().await;
    if db.projects.values().any(|p| p.slug == input.slug) {
        return Err(BackendError::BadRequest("Slug already exists".to_string()));
    }
    let project = Project {
        id: db.next_id(),
        title: input.title,
        slug: input.slug,
        description: input.description,
        content: input.content,
        image_url: input.image_url,
        project_url: input.project_url,
        github_url: input.github_url,
        status: input.status,
        created_at: Utc::now(),
        updated_at: None,
    };
    db.projects.insert(project.id, project.clone());
    Ok((StatusCode::CREATED, Json(project)))
}

async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ProjectUpdate>,
) -> Result<Json<Project>> {
    let mut db = state.db.write().await;
    let project = db
        .projects
        .get_mut(&id)
        .ok_or_else(|| BackendError::NotFound(PROJECT_NOT_FOUND.to_string()))?;
    if let Some(title) = input.title {
        project.title = title;
    }
    if let Some(slug) = input.slug {
        project.slug = slug;
    }
    if let Some(description) = input.description {
        project.description = description;
    }
    if let Some(status) = input.status {
        project.status = status;
    }
    if input.content.is_some() {
        project.content = input.content;
    }
    if input.image_url.is_some() {
        project.image_url = input.image_url;
    }
    if input.project_url.is_some() {
        project.project_url = input.project_url;
    }
    if input.github_url.is_some() {
        project.github_url = input.github_url;
    }
    project.updated_at = Some(Utc::now());
    Ok(Json(project.clone()))
}

async fn delete_project(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    let mut db = state.db.write().await;
    db.projects
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| BackendError::NotFound(PROJECT_NOT_FOUND.to_string()))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(BackendError::Unprocessable(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(BackendError::Unprocessable(format!(
            "{email} is not a valid email address"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_create_applies_defaults() {
        let input: UserCreate = serde_json::from_str(
            r#"{"username":"hanni","email":"h@example.com","password":"pw"}"#,
        )
        .unwrap();
        assert_eq!(input.role, "user");
        assert!(input.is_active);
        assert!(input.images.is_empty());
    }

    #[test]
    fn user_create_rejects_missing_password() {
        let result: std::result::Result<UserCreate, _> =
            serde_json::from_str(r#"{"username":"hanni","email":"h@example.com"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn post_create_defaults_to_draft() {
        let input: PostCreate =
            serde_json::from_str(r#"{"title":"T","slug":"t","content":"c"}"#).unwrap();
        assert_eq!(input.status, "draft");
    }

    #[test]
    fn errors_map_to_fastapi_statuses() {
        let resp = BackendError::NotFound(USER_NOT_FOUND.to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = BackendError::Unauthorized.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn length_and_email_checks() {
        assert!(check_len("message", "short", 10, 2000).is_err());
        assert!(check_len("message", "long enough text", 10, 2000).is_ok());
        assert!(check_email("a@b.co").is_ok());
        assert!(check_email("nope").is_err());
        assert!(check_email("@b.co").is_err());
    }
}
