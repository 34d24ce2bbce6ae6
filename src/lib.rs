//! Periodic chatbox broadcaster.
//!
//! A [`Controller`](controller::Controller) owns a shared
//! [`MessageBuffer`](buffer::MessageBuffer) and drives a background worker
//! that renders the buffer and sends it over OSC/UDP on a fixed interval.

pub mod buffer;
pub mod config;
pub mod controller;
pub mod error_log;
pub mod files;
pub mod logging;
pub mod render;
pub mod shell;
pub mod shutdown;
pub mod transport;
pub mod worker;
