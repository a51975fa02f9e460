//! The portfolio API client.
//!
//! # Design
//! `ApiClient` holds the base URL, a `Transport` and an optional `Session`.
//! It carries no other state: nothing is cached and concurrent identical
//! calls are not merged. Each call is three steps:
//!
//! 1. `build_request` (pure) joins the endpoint to the base URL and merges
//!    headers.
//! 2. The transport performs exactly one round-trip; there are no retries.
//! 3. `response::normalize` (pure) turns the outcome into an `ApiResult`.
//!
//! Whatever goes wrong, the caller gets an `Err(ApiError)`; no panic and no
//! transport error escapes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpRequest};
use crate::response::{decode, normalize_outcome};
use crate::session::{FileTokenStore, Session};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    ContactForm, ContactMessage, CreatePostRequest, CreateProjectRequest, CreateUserRequest,
    Health, LoginRequest, LoginResponse, NewsletterRequest, Post, Project, StatPoint,
    Subscription, UpdatePostRequest, UpdateProjectRequest, UpdateUserRequest, User,
};

pub const CONTACT: &str = "/api/contact/";
pub const NEWSLETTER_SUBSCRIBE: &str = "/api/newsletter/subscribe";
pub const HEALTH: &str = "/api/health";
pub const ADMIN_LOGIN: &str = "/api/admin/login";
pub const ADMIN_STATS: &str = "/api/admin/stats";
pub const ADMIN_CONTACTS: &str = "/api/admin/contacts";
pub const USERS: &str = "/api/users/";
pub const POSTS: &str = "/api/content/posts";
pub const PROJECTS: &str = "/api/content/projects";

const JSON: &str = "application/json";

/// Whether an operation forwards the session's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    None,
    Bearer,
}

#[derive(Debug, Clone)]
pub struct ApiClient<T = UreqTransport> {
    base_url: String,
    transport: T,
    session: Option<Session>,
}

impl ApiClient<UreqTransport> {
    /// Client for the configured backend, with the token persisted to the
    /// configured session file.
    pub fn from_config(config: &ClientConfig) -> Self {
        ApiClient::new(&config.api_url, UreqTransport::new())
            .with_session(Session::new(FileTokenStore::new(&config.session_file)))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            session: None,
        }
    }

    /// Attach a session: protected calls forward its token and `login`
    /// stores the token it receives.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    // -----------------------------------------------------------------------
    // Generic request
    // -----------------------------------------------------------------------

    /// Build a request without sending it.
    ///
    /// `Content-Type: application/json` is always present; a caller header
    /// with the same name (any case) replaces it, other caller headers are
    /// appended in order.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        headers: &[(String, String)],
    ) -> HttpRequest {
        let mut merged = vec![("content-type".to_string(), JSON.to_string())];
        for (name, value) in headers {
            match merged
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            {
                Some(slot) => slot.1 = value.clone(),
                None => merged.push((name.clone(), value.clone())),
            }
        }

        HttpRequest {
            method,
            url: format!("{}{endpoint}", self.base_url),
            headers: merged,
            body: body.map(Value::to_string),
        }
    }

    /// Send one request and return its normalized, untyped payload.
    pub fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        headers: &[(String, String)],
    ) -> ApiResult<Value> {
        let request = self.build_request(method, endpoint, body, headers);
        debug!(%method, url = %request.url, "api request");
        normalize_outcome(self.transport.execute(&request))
    }

    // -----------------------------------------------------------------------
    // Public site
    // -----------------------------------------------------------------------

    pub fn submit_contact(&self, form: &ContactForm) -> ApiResult<ContactMessage> {
        self.send(HttpMethod::Post, CONTACT, Some(form), Auth::None)
    }

    pub fn subscribe_newsletter(&self, email: &str) -> ApiResult<Subscription> {
        let body = NewsletterRequest {
            email: email.to_string(),
        };
        self.send(HttpMethod::Post, NEWSLETTER_SUBSCRIBE, Some(&body), Auth::None)
    }

    pub fn check_health(&self) -> ApiResult<Health> {
        self.send(HttpMethod::Get, HEALTH, None::<&()>, Auth::None)
    }

    // -----------------------------------------------------------------------
    // Admin
    // -----------------------------------------------------------------------

    /// Log in and, when a session is attached, store the returned token.
    pub fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse =
            self.send(HttpMethod::Post, ADMIN_LOGIN, Some(&body), Auth::None)?;
        if let Some(session) = &self.session {
            session.store_token(&response.token)?;
        }
        Ok(response)
    }

    pub fn admin_stats(&self) -> ApiResult<Vec<StatPoint>> {
        self.send(HttpMethod::Get, ADMIN_STATS, None::<&()>, Auth::Bearer)
    }

    pub fn admin_contacts(&self) -> ApiResult<Vec<ContactMessage>> {
        self.send(HttpMethod::Get, ADMIN_CONTACTS, None::<&()>, Auth::Bearer)
    }

    pub fn delete_admin_contact(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("{ADMIN_CONTACTS}/{id}"))
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn list_users(&self) -> ApiResult<Vec<User>> {
        self.send(HttpMethod::Get, USERS, None::<&()>, Auth::Bearer)
    }

    pub fn get_user(&self, id: i64) -> ApiResult<User> {
        self.send(HttpMethod::Get, &format!("{USERS}{id}"), None::<&()>, Auth::Bearer)
    }

    pub fn create_user(&self, input: &CreateUserRequest) -> ApiResult<User> {
        input.validate()?;
        self.send(HttpMethod::Post, USERS, Some(input), Auth::Bearer)
    }

    pub fn update_user(&self, id: i64, input: &UpdateUserRequest) -> ApiResult<User> {
        input.validate()?;
        self.send(HttpMethod::Put, &format!("{USERS}{id}"), Some(input), Auth::Bearer)
    }

    pub fn delete_user(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("{USERS}{id}"))
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    pub fn list_posts(&self) -> ApiResult<Vec<Post>> {
        self.send(HttpMethod::Get, POSTS, None::<&()>, Auth::Bearer)
    }

    pub fn create_post(&self, input: &CreatePostRequest) -> ApiResult<Post> {
        self.send(HttpMethod::Post, POSTS, Some(input), Auth::Bearer)
    }

    pub fn update_post(&self, id: i64, input: &UpdatePostRequest) -> ApiResult<Post> {
        self.send(HttpMethod::Put, &format!("{POSTS}/{id}"), Some(input), Auth::Bearer)
    }

    pub fn delete_post(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("{POSTS}/{id}"))
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn list_projects(&self) -> ApiResult<Vec<Project>> {
        self.send(HttpMethod::Get, PROJECTS, None::<&()>, Auth::Bearer)
    }

    pub fn create_project(&self, input: &CreateProjectRequest) -> ApiResult<Project> {
        self.send(HttpMethod::Post, PROJECTS, Some(input), Auth::Bearer)
    }

    pub fn update_project(&self, id: i64, input: &UpdateProjectRequest) -> ApiResult<Project> {
        self.send(HttpMethod::Put, &format!("{PROJECTS}/{id}"), Some(input), Auth::Bearer)
    }

    pub fn delete_project(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("{PROJECTS}/{id}"))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn send<B, R>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let value = self.request(method, endpoint, body.as_ref(), &self.auth_headers(auth))?;
        decode(value)
    }

    /// Deletes succeed with an empty payload whatever the backend returns
    /// (204 or a confirmation message).
    fn delete(&self, endpoint: &str) -> ApiResult<()> {
        self.request(HttpMethod::Delete, endpoint, None, &self.auth_headers(Auth::Bearer))
            .map(|_| ())
    }

    fn auth_headers(&self, auth: Auth) -> Vec<(String, String)> {
        if auth == Auth::None {
            return Vec::new();
        }
        let Some(session) = &self.session else {
            return Vec::new();
        };
        match session.token() {
            Ok(Some(token)) => vec![("authorization".to_string(), format!("Bearer {token}"))],
            Ok(None) => Vec::new(),
            Err(e) => {
                // The backend decides whether the call needs the token.
                warn!(error = %e, "could not read session token");
                Vec::new()
            }
        }
    }
}
