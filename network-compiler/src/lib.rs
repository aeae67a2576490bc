//! Transit network compiler.
//!
//! Turns a static transit feed into a compact, mode-annotated station graph
//! for one service day and time-of-day window, ready for an offline
//! shortest-path client.

pub mod batch;
pub mod builder;
pub mod canonical;
pub mod compiler;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod identity;
pub mod modes;
pub mod serialize;
pub mod window;

#[cfg(test)]
mod testing;
