//! Corkboard — a task-board synchronization engine.
//!
//! Reconciles local board state with an eventually-consistent per-user
//! document store: snapshot subscriptions drive a recomputed projection,
//! drag-and-drop moves apply optimistically before the remote write
//! resolves, and deleting a column relocates its tasks instead of
//! orphaning them.
//!
//! # Architecture
//!
//! - [`interfaces`] - trait seams for the document store and identity
//! - [`providers`] - in-memory store and local identity fallback
//! - [`model`] - Column, Task, ChecklistItem, Personnel records
//! - [`board`] - stores, projection, context, and the mutation engine
//! - [`drag_fsm`] - drag gesture state machine
//! - [`config`] - runtime configuration
//! - [`error`] - error types and handling

pub mod board;
pub mod config;
pub mod drag_fsm;
pub mod error;
pub mod interfaces;
pub mod logging;
pub mod model;
pub mod providers;

pub use error::{BoardError, Result};
