//! Response models for the demo API
//!
//! This module defines the DTOs serialized into HTTP response bodies.

pub mod responses;

// Re-export commonly used types
pub use responses::{CacheStatsResponse, HealthResponse, MeResponse, StatsResponse};
