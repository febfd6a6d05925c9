//! The reporting obligation and its history.
//!
//! A person's obligation changes over time. Snapshots are kept in a
//! [`TemporalCollection`] so the obligation governing any past instant can be
//! looked up without rewriting history.

mod temporal;
mod variants;

pub use temporal::TemporalCollection;
pub use variants::{ObligationEffect, ObligationKind, ReportingObligation};
