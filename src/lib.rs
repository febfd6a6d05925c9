//! Activity Reporting Engine
//!
//! This crate implements the domain state machine of a benefits activity
//! reporting system: a person's reporting obligation history, the 14-day
//! reporting periods with their approval and submission lifecycle, the
//! day-by-day activity timeline, and the correction chains that let a
//! submitted period be amended without losing history.

#![warn(missing_docs)]

pub mod api;
pub mod calendar;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod models;
pub mod obligation;
pub mod person;
pub mod store;
