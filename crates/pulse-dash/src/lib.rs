//! Orchestration core for the channel-analysis dashboard.
//!
//! Architecture:
//! - `ApiClient` is the only thing that talks HTTP; it maps status codes and
//!   schema violations into the `DashError` taxonomy at the boundary.
//! - Each orchestration concern lives in its own component: quota gating,
//!   update polling, list/selection consistency, notifications, export.
//! - `Dashboard` owns the components and is what a host shell drives.
//! - No component mutates another's state; shared snapshots are read through
//!   accessor methods, and locks are never held across an await.

pub mod client;
pub mod dashboard;
pub mod export;
pub mod notify;
pub mod quota;
pub mod resource;
pub mod selection;
pub mod updates;

pub use client::ApiClient;
pub use dashboard::{Dashboard, Session};
pub use pulse_proto::DashError;
