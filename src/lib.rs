//! # naturalist - an async client for the iNaturalist API
//!
//! `naturalist` wraps the iNaturalist REST API: OAuth2 login, an authenticated
//! client, and typed access to observations, projects, comments, places and
//! the signed-in user.
//!
//! ## Quick Start
//!
//! ```no_run
//! use naturalist::{AuthConfig, Authenticator, GetObservationsOpt};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), naturalist::Error> {
//!     let auth = Authenticator::new(AuthConfig::new(
//!         "my-app-id",
//!         "my-app-secret",
//!         "http://localhost:8000/callback",
//!     ))?;
//!
//!     // Send the user here, then receive `code` on the callback.
//!     println!("Log in at {}", auth.authorization_url());
//!     let token = auth.exchange("code-from-callback").await?;
//!
//!     let client = auth
//!         .client_builder(&token)?
//!         .auto_retry(Duration::from_secs(5), 3)
//!         .build()?;
//!
//!     let me = client.current_user().await?;
//!     println!("Signed in as {}", me.login);
//!
//!     let opt = GetObservationsOpt { page: Some(2), ..Default::default() };
//!     let page = client.get_observations(Some(&opt)).await?;
//!     if let Some(paging) = page.paging {
//!         println!("page {} of {}", paging.page, paging.total_pages());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Retries
//!
//! The API answers `429 Too Many Requests` when throttling and
//! `202 Accepted` when a write is queued. With retries enabled the client
//! waits and resends the identical request, at most `max_retries` times:
//!
//! - listing calls retry on 429 only;
//! - mutating calls retry on 202 and 429.
//!
//! Running out of retries yields [`Error::MaxRetriesExceeded`]. Both sets of
//! statuses can be replaced with a custom [`RetryPredicate`].
//!
//! ## Pagination
//!
//! Listing endpoints return a [`Page`] whose `paging` field holds the
//! `X-Total-Entries` / `X-Per-Page` / `X-Page` headers, or `None` when the
//! server did not paginate the response.

pub mod auth;
mod client;
pub mod comments;
mod error;
pub mod metadata;
pub mod observations;
pub mod pagination;
pub mod places;
pub mod projects;
pub mod rate_limit;
pub mod resource;
mod response;
pub mod retry;
pub mod users;

pub use auth::{AuthConfig, Authenticator, Token};
pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL};
pub use comments::{AddCommentOpt, Comment, CommentParentType, UpdateCommentOpt};
pub use error::{Error, ProviderError, Result};
pub use observations::{
    AddObservationOpt, FullObservation, GetObservationsOpt, ObservationFields, ObservationPhoto,
    ObservationsPage, SimpleObservation, SimplePhoto, UpdateObservationOpt,
};
pub use pagination::{Page, PageHeaders};
pub use places::{GetPlacesOpt, Place, PlacesPage};
pub use projects::{
    FullProject, GetProjectsOpt, ProjectMember, ProjectMembersPage, ProjectObservation,
    ProjectsPage, SimpleProject,
};
pub use resource::{ResourceRef, SimpleUser, Timestamp};
pub use response::Response;
pub use retry::{RetryPredicate, RetryStrategy};
pub use users::PrivateUser;
