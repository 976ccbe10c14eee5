//! In-memory student attendance tracking: rosters, subjects, class
//! sessions, monthly and exam-window attendance, and summary reports.

pub mod attendance;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod report;
pub mod roster;
pub mod seed;
pub mod summary;
pub mod tracker;

pub use error::{TrackerError, TrackerResult};
pub use tracker::Tracker;
