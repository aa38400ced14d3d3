//! Host primitives the interpreter runs effects against.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::post::ResourceId;

/// Errors a host primitive can report.
#[derive(Debug, Error)]
pub enum HostError {
    /// Could not reach the remote service
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The remote service did not answer in time
    #[error("Request timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// The remote service answered with a non-success status
    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The configured base URL cannot carry request paths
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    /// Reading or writing local storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Asynchronous primitives provided by the host environment.
///
/// Implementations perform real I/O. They never see a [`crate::post::Cmd`];
/// the [`super::Interpreter`] decides which primitive a command maps to.
#[async_trait]
pub trait Host: Send + Sync + 'static {
    /// Fetch the body of a remote resource.
    async fn fetch_resource(&self, id: &ResourceId) -> Result<String, HostError>;

    /// Place one beer order.
    async fn order_beer(&self) -> Result<(), HostError>;

    /// Write a package body to storage.
    async fn persist(&self, id: &ResourceId, body: &str) -> Result<(), HostError>;

    /// Current wall-clock time in Unix milliseconds.
    fn now_ms(&self) -> u64;

    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}
