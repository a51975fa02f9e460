//! Client core for the portfolio site and its admin back-office.
//!
//! # Overview
//! - `client`: `ApiClient`, one method per backend operation, each returning
//!   an `ApiResult`. Failures of every kind (transport, HTTP status, decode)
//!   are normalized into `ApiError`; nothing panics past the client.
//! - `session`: the admin bearer token behind a get/set/clear store.
//! - `countdown` / `birthday`: yearly recurrence of a month/day and the
//!   time left until its next occurrence.
//! - `search`: the admin pages' client-side list filtering.
//!
//! # Design
//! - Requests and responses are plain data (`http`). Building a request and
//!   normalizing a response are pure; only a `Transport` does I/O.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod birthday;
pub mod client;
pub mod config;
pub mod countdown;
pub mod error;
pub mod external;
pub mod http;
pub mod response;
pub mod search;
pub mod session;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use countdown::{Countdown, InvalidMonthDay, Phase, RecurringDate, Ticker};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{FileTokenStore, MemoryTokenStore, Session, SessionError, TokenStore};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{
    ContactForm, ContactMessage, CreatePostRequest, CreateProjectRequest, CreateUserRequest,
    Health, LoginResponse, Post, PostStatus, Project, ProjectStatus, Role, StatPoint,
    Subscription, UpdatePostRequest, UpdateProjectRequest, UpdateUserRequest, User, UserImage,
};
