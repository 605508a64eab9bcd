//! JSON-RPC API for the Lineup queue engine.
//!
//! Exposes the queue/entry lifecycle operations over JSON-RPC 2.0 on
//! localhost TCP. Transport and authentication are collaborator concerns;
//! callers arrive with an already-resolved identity in `caller_id`.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use rate_limiter::RateLimiter;
pub use server::{RpcServer, RpcServerConfig};
