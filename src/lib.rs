//! spotter: a terminal viewfinder that identifies what the camera sees.
//!
//! Components are exposed as a library crate so the pipeline can be
//! exercised from integration tests without a camera attached.

pub mod camera;
pub mod classify;
pub mod cli;
pub mod config;
pub mod event_loop;
pub mod preview;
pub mod session;
pub mod speech;
pub mod ui;
