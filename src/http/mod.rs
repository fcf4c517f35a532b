//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, request span)
//!     → middleware/ (metrics, circuit breaker, API key)
//!     → api handlers
//!     → response.rs (hypermedia links, pages) / error.rs (status mapping)
//!     → Send to client
//! ```

pub mod error;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use response::{Link, Links, Page};
pub use server::{AppState, HttpServer, ServerError};
