//! Client library for the Ruppin student portal.
//!
//! The portal speaks JSON-POST with a bearer token. This crate wraps the
//! endpoints a student app needs (schedule, grades, home screen), caches
//! week-schedule windows so a month view fetches each week at most once,
//! and ships a grade poller that diffs fetched grades against a persisted
//! snapshot to raise notifications only for genuinely new grade updates.

pub mod client;
pub mod config;
pub mod error;
pub mod grades;
pub mod notify;
pub mod schedule;
pub mod storage;
pub mod types;

pub use client::PortalClient;
pub use config::{AgentConfig, PortalConfig};
pub use error::PortalError;
pub use grades::{GradeCheckJob, GradePoller, GradeSnapshot, PollReport};
pub use schedule::{ScheduleCache, YearMonth};
