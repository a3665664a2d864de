//! Admission control for the guarded API.

mod limiter;
mod scheduler;
mod window;

pub use limiter::{AdmissionLimiter, AdmissionPolicy};
pub use window::TimeUnit;
