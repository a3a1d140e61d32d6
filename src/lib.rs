//! Task Tracker library.
//!
//! Employees, tasks assigned to them, and a completion dashboard, served
//! over a JSON REST API. This module exports the core components for
//! testing and integration.

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod types;
