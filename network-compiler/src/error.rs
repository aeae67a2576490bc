//! Errors that abort a single compilation.
//!
//! Everything else (malformed times, builder failures, dangling edges,
//! empty windows) is absorbed and only shows in the output's size.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::feed::FeedError;
use crate::window::WindowError;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The feed archive does not exist
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The archive lacks a required table
    #[error("feed is missing required table {0}.txt")]
    MissingTable(&'static str),

    /// A table lacks a required column
    #[error("{table}.txt is missing required column {column}")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    /// Any other failure while reading the feed
    #[error("failed to read feed: {0}")]
    Feed(FeedError),

    /// No service runs on the requested date
    #[error("no active service on {date}")]
    NoActiveService { date: NaiveDate },

    /// The artifact could not be written
    #[error("failed to write {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The artifact could not be encoded
    #[error("failed to encode artifact: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FeedError> for CompileError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::NotFound(path) => CompileError::InputNotFound(path),
            FeedError::MissingTable(table) => CompileError::MissingTable(table),
            FeedError::MissingColumn { table, column } => {
                CompileError::MissingColumn { table, column }
            }
            other => CompileError::Feed(other),
        }
    }
}

impl From<WindowError> for CompileError {
    fn from(err: WindowError) -> Self {
        match err {
            WindowError::NoActiveService { date } => CompileError::NoActiveService { date },
        }
    }
}
