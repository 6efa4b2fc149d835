//! Core types and orchestration.
//!
//! The project tree, the canonical result and its diff engine, the backend
//! and branch capabilities, and the runner that ties them together.

pub mod backend;
pub mod branch;
pub mod builder;
pub mod config;
pub mod error;
pub mod fixture;
pub mod logging;
pub mod output;
pub mod project;
pub mod result;
pub mod runner;
pub mod validation_error;
