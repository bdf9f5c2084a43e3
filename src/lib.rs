//! # kube-pfs-dashboard
//!
//! A terminal dashboard for the kube-pfs demo environment. It polls the
//! demo-ui backend on a fixed period and renders cluster status, the
//! fault-injection timeline, the latest benchmark run and four live
//! Prometheus gauges.
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Layered TOML configuration and `--set` overrides |
//! | [`error`] | Crate error type and `Result` alias |
//! | [`backend`] | The `Backend` seam: HTTP, canned, and timeout-bounded |
//! | [`normalize`] | Total adapters from raw JSON to panel models |
//! | [`prometheus`] | The four gauge queries and their reduction |
//! | [`poller`] | Bootstrap, refresh cycles, and snapshot publication |
//! | [`model`] | Canonical panel models and the per-cycle snapshot |
//! | [`format`] | Numeric display formatting |
//! | [`tui`] | Terminal rendering and key handling |
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use kube_pfs_dashboard::{backend::HttpBackend, poller, Config};
//!
//! # async fn demo() -> kube_pfs_dashboard::Result<()> {
//! let config = Config::default();
//! let backend = HttpBackend::new(&config.backend.base_url, config.backend.request_timeout())?;
//! let ctx = poller::DashboardContext::bootstrap(Arc::new(backend), &config).await;
//! let snapshot = poller::run_cycle(&ctx, 1).await;
//! println!("{}", kube_pfs_dashboard::tui::view::render_text(&snapshot, ctx.prometheus_url(), ctx.grafana_url()));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod normalize;
pub mod poller;
pub mod prometheus;
pub mod tui;

pub use config::Config;
pub use error::{DashboardError, Result};
