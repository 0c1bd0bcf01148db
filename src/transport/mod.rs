//! Transport abstraction layer.
//!
//! Everything the client sends to the Service Layer goes through the
//! `Transport` trait:
//! - `ReqwestTransport` for real HTTP(S)
//! - `MockTransport` with scripted responses for testing

pub mod http;
pub mod mock;
pub mod traits;

pub use http::ReqwestTransport;
pub use mock::MockTransport;
pub use traits::{HttpRequest, HttpResponse, Method, Transport, TransportError};
