//! Client for the website tracking/cookie audit service.
//!
//! The lifecycle of one audit: create it from a submitted URL, poll the
//! backend until the analysis reaches a terminal status, gate the report
//! behind an email capture step, then derive render-ready values (grades,
//! labels, signal levels) from the raw scores.

pub mod cli;
pub mod client;
pub mod model;
pub mod orchestrator;
pub mod poller;
pub mod score;
pub mod text_summary;
