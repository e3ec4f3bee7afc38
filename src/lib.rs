//! # ghost-api - typed client for the Ghost blogging platform
//!
//! A Rust client for the Ghost admin REST API: authentication, posts, tags
//! and image upload. Requests are described as plain values, sent through a
//! pluggable [`Transport`], and decoded into typed entities.
//!
//! ## Features
//!
//! - Declarative [`Endpoint`] routing and a transport-agnostic [`Request`] builder
//! - JSON codecs for posts, tags, tokens and credentials
//! - Paginated listings with `meta.pagination` metadata
//! - OAuth2 access tokens with automatic refresh-and-retry; concurrent
//!   requests share a single refresh
//! - Multipart image upload
//!
//! ## Basic Usage
//!
//! ```no_run
//! use ghost_api::{ApiClient, Config, EmailCredentials, Post, PostsRequestOptions, Tag};
//!
//! # async fn run() -> ghost_api::Result<()> {
//! let client = ApiClient::new(Config::new("http://localhost:2368/ghost/api/v0.1/"))?;
//!
//! // Encoding errors are reported before anything is sent
//! client
//!     .login(&EmailCredentials::new("me@example.com", "secret"))?
//!     .await?;
//!
//! let page = client.posts(PostsRequestOptions::default()).await?;
//! println!("{} posts", page.items.len());
//!
//! let post = Post::new("Hello", "# Hello world").with_tags(vec![Tag::new("news")]);
//! let created = client.add_post(&post)?.await?;
//! if let Some(created) = created.first() {
//!     client.delete_post(created).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Completion callbacks
//!
//! ```no_run
//! use ghost_api::{ApiClient, Config};
//!
//! # async fn run() -> ghost_api::Result<()> {
//! let client = ApiClient::new(Config::default())?;
//! let task = client.tags().spawn(|result| match result {
//!     Ok(tags) => println!("{} tags", tags.items.len()),
//!     Err(e) => eprintln!("failed: {}", e),
//! });
//! task.cancel();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod codec;
pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod pagination;
pub mod post;
pub mod refresh;
pub mod request;
pub mod response;
pub mod tag;
pub mod task;
pub mod token;
pub mod transport;
pub mod upload;

// Re-export main types for convenience
pub use api::ApiClient;
pub use client::Config;
pub use codec::{JsonDecode, JsonEncode};
pub use credentials::{EmailCredentials, RefreshTokenCredentials};
pub use endpoint::Endpoint;
pub use error::{ApiError, CredentialField, Result};
pub use pagination::{
    PageRequest, Pagination, PaginationMetadata, PostsPagination, TagsPagination,
};
pub use post::{
    PersistedPost, Post, PostId, Posts, PostsRequestOptions, StaticFilter, StatusFilter,
};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use tag::{Tag, TagId};
pub use task::{PendingRequest, RequestTask};
pub use token::{AccessToken, CredentialStore, InMemoryCredentialStore};
pub use transport::{ReqwestTransport, Transport};
pub use upload::UploadSource;
