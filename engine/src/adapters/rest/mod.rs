//! REST API Driving Adapter
//!
//! Exposes the service manager through an HTTP API (JSON), served over TCP.
//! Log files are additionally streamed as Server-Sent Events.

pub mod handlers;
pub mod router;
pub mod server;

pub use router::build_router;
pub use server::serve_on_tcp;
