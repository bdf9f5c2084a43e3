//! Terminal dashboard
//!
//! Renders the latest published [`DashboardSnapshot`](crate::model::DashboardSnapshot)
//! as five panels: cluster status, benchmark, fault timeline, live metrics
//! and links.
//!
//! # Architecture
//!
//! - [`app`] - Application state, event loop, and keyboard handling
//! - [`ui`] - Layout rendering
//! - [`widgets`] - Reusable TUI widget components
//! - [`view`] - Panel text shared by the terminal UI and `--once` output

pub mod app;
pub mod ui;
pub mod view;
pub mod widgets;
