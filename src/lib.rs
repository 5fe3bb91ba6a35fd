//! # screenflow
//!
//! Screen-driven service lifecycle engine for client applications.
//!
//! An application moves between named screens. Each screen declares the
//! long-lived services it needs; on every transition the engine decides, per
//! service, whether to carry the existing instance over, build a fresh one,
//! or tear it down.
//!
//! ## Features
//!
//! - **Generational reuse**: an instance survives a transition only if every
//!   dependency it declared resolves to the very same instance again
//! - **Explicit configs**: passing a [`ServiceConfig`] forces a rebuild, and
//!   the config is carried forward to later generations
//! - **Dependency-ordered async init**: a service's `init` runs after all of
//!   its dependencies finished theirs, shared dependencies initialize once
//! - **Transactional transitions**: the committed [`Generation`] only changes
//!   when a whole transition succeeds; failures leave it untouched
//! - **Redirects**: a transition requested while another is activating
//!   supersedes it
//! - **Circular dependency detection** with the full path in the error
//!
//! ## Quick Start
//!
//! ```rust
//! use screenflow::{App, Block, BuildContext, Screen, Service, ServiceError, View};
//! use std::sync::Arc;
//!
//! struct Http {
//!     base_url: String,
//! }
//!
//! #[async_trait::async_trait]
//! impl Service for Http {
//!     type Params = String;
//!
//!     fn build(_: &mut BuildContext<'_>, base_url: &String) -> Result<Self, ServiceError> {
//!         Ok(Http { base_url: base_url.clone() })
//!     }
//! }
//!
//! struct Inbox {
//!     http: Arc<Http>,
//! }
//!
//! #[async_trait::async_trait]
//! impl Service for Inbox {
//!     type Params = ();
//!
//!     fn build(ctx: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
//!         Ok(Inbox { http: ctx.require::<Http>()? })
//!     }
//!
//!     async fn init(&self, _: &()) -> Result<(), ServiceError> {
//!         // Http is initialized by now
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let content = Block::new("content");
//! let inbox = Screen::new("inbox").define([View::new(&content).require::<Inbox>()]);
//!
//! let app = App::new();
//! let generation = app
//!     .go(inbox, [Http::with("https://mail.example".to_string())])
//!     .await
//!     .unwrap();
//!
//! let service = generation.get_required::<Inbox>().unwrap();
//! assert_eq!(service.http.base_url, "https://mail.example");
//! assert!(generation.contains::<Http>());
//! # });
//! ```
//!
//! ## Lifecycle
//!
//! - **Resolve**: synchronous, builds or reuses every service the screen needs
//! - **Init**: asynchronous, each instance at most once
//! - **Commit**: the new generation becomes current and every previous
//!   instance it does not hold is destroyed, dependents first
//!
//! Logging goes through `tracing`; register a [`LoggingObserver`] on the
//! [`AppBuilder`] to get one event per lifecycle decision.

// Module declarations
pub mod app;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod generation;
pub mod key;
pub mod observer;
pub mod resolver;
pub mod screen;
pub mod traits;

// Internal modules
mod instance;
mod internal;

// Re-export core types
pub use app::{App, AppBuilder, AppHandle, HistoryEntry, TransitionOutcome, TransitionRequest};
pub use config::AppConfig;
pub use descriptors::{ServiceConfig, ServiceType};
pub use error::{DiError, DiResult, ServiceError, SharedError};
pub use generation::Generation;
pub use key::{key_of, ServiceKey};
pub use observer::{LoggingObserver, TransitionObserver};
pub use resolver::{BuildContext, Resolver};
pub use screen::{Block, Screen, View};
pub use traits::Service;
