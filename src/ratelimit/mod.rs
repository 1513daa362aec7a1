//! Per-client admission control
//!
//! The limiter itself only sees opaque client keys; how a request is mapped
//! to a key is decided by the transport through [`ClientKeyPolicy`].

pub mod client_key;
pub mod limiter;

pub use client_key::{extract_client_key, ClientKeyPolicy};
pub use limiter::{RateLimitConfig, RateLimiter};
