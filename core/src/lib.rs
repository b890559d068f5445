//! Blocking client for the LangSmith tracing and evaluation API.
//!
//! # Overview
//! Create and patch runs, manage datasets and examples, upload CSV datasets
//! and experiments, compare experiments, post feedback, manage tracer
//! sessions and query runs. Every operation is a single HTTP round-trip.
//!
//! # Design
//! - `LangsmithClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network, so it works with any HTTP stack.
//! - `Client` pairs it with a `Transport` (ureq by default) and exposes one
//!   method per remote operation.
//! - The API key and base URL are fixed at construction; nothing is cached,
//!   queued or retried.
//! - Timestamps use the service's second-precision wire format through
//!   `LangsmithTime`.
//!
//! ```no_run
//! use langsmith_core::{Client, ClientConfig, Feedback};
//!
//! let client = Client::new(ClientConfig::new("lsv2_..."))?;
//! client.create_feedback(&Feedback {
//!     key: "correctness".to_string(),
//!     score: Some(1.into()),
//!     run_id: Some("2f7c6c5e-3c0a-4a8e-9d55-0c2b1f8b0f11".to_string()),
//!     ..Default::default()
//! })?;
//! # Ok::<(), langsmith_core::ApiError>(())
//! ```

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod time;
pub mod types;

pub use blocking::Client;
pub use client::LangsmithClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use time::LangsmithTime;
pub use types::*;
