//! Docgate - client-side admission control for a document registration API
//!
//! This crate caps outbound calls to a remote API at N per time window.
//! Callers that would exceed the cap are held until the window resets
//! instead of being rejected, and every guarded call goes through a single
//! [`ratelimit::AdmissionLimiter`] instance.

pub mod config;
pub mod error;
pub mod ratelimit;
pub mod transport;
