//! # fetch-state
//!
//! Request orchestration for UI bindings: loading / error / payload state for
//! an asynchronous fetch, with an optional cache in front of a pluggable
//! network function.
//!
//! A binding layer (whatever owns components and their props) drives the core
//! through three lifecycle calls on a [`TriggerPolicy`]: `init`,
//! `on_inputs_changed`, and `dispose`. State flows back through a
//! [`LifecycleGuard`] into a sink the binding layer provides.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fetch_state::{RequestClient, RequestConfig, RequestData, StateStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RequestClient::new(|request: RequestData<()>| async move {
//!         Ok::<_, String>(format!("payload for {}", request.url))
//!     });
//!     let definition = client.define(RequestConfig::<u32, (), (), String>::new(
//!         |id: &u32, _: Option<&()>| format!("/items/{id}"),
//!     ))?;
//!
//!     let store = StateStore::from_state(definition.initial_state());
//!     let mut instance = definition.mount(7, store.sink());
//!     if let Some(pending) = instance.init()? {
//!         pending.await?;
//!     }
//!     println!("{:?}", store.snapshot().payload());
//!
//!     instance.dispose()?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod descriptor;
pub mod guard;
pub mod http;
pub mod orchestrator;
pub mod state;
pub mod trigger;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{CacheAdapter, CacheError, CacheResult, MemoryCache, NoCache};
pub use client::{RequestClient, RequestDefinition};
pub use config::{ConfigError, RequestConfig, RequestOptions};
pub use guard::LifecycleGuard;
pub use http::{Headers, Method, RequestData};
pub use orchestrator::{FetchOrchestrator, IntoFetch};
pub use state::{RequestState, StateSink, StateStore, StateUpdate};
pub use trigger::{LifecycleError, Pending, Phase, TriggerPolicy};
