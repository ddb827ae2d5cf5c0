//! # reqlog
//!
//! Access-log middleware for axum routers and other tower services.
//!
//! Every exchange passing through [`AccessLogLayer`] produces exactly one line once it
//! completes: when the response body ends, when the response is dropped early, when
//! the handler fails, or after the `forceLog` timeout, whichever comes first. Lines go
//! to the console (ANSI-styled or plain) and, when a folder is configured, to a
//! `<folder>/<YYYY-MM-DD>.log` file that rotates at UTC midnight.
//!
//! Handlers that hold a connection open (upgrades, streams) can log early by
//! extracting the [`FinalizeHandle`] from request extensions:
//!
//! ```ignore
//! async fn upgrade(Extension(log): Extension<FinalizeHandle>) -> StatusCode {
//!     log.finalize();
//!     StatusCode::SWITCHING_PROTOCOLS
//! }
//! ```
//!
//! Rendering and sinks live in `reqlog-core` and `reqlog-logging`; this crate
//! re-exports what a host needs.

mod body;
mod layer;
mod request;

pub use body::AccessLogBody;
pub use layer::{AccessLogLayer, AccessLogService, ResponseFuture};

pub use reqlog_core::{
    AccessLogConfig, AccessLogger, ConfigError, ConsoleTarget, Env, Exchange, FinalizeHandle,
    Formatter, Item, Token, Trigger,
};
pub use reqlog_logging::init_tracing;
