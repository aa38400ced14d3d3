//! State for the post office.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mvi::AppState;

/// Name of a city with a mailbox. Case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct City(String);

impl City {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for City {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Identifier of a remote resource (a postcode).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Retry settings for failed fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total fetch attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each later retry.
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// Delay before retrying after `attempt` failed (1-based).
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(63);
        self.backoff_base_ms.saturating_mul(1u64 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 100,
        }
    }
}

/// Lifecycle of a package retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackageStatus {
    /// A fetch is running.
    Requested {
        /// Current attempt (1-based).
        attempt: u32,
    },

    /// Last fetch failed, a retry timer is running.
    WaitingRetry {
        /// Attempt that failed.
        attempt: u32,
        /// Error from that attempt.
        error: String,
    },

    /// Cancel requested while a fetch was running; waiting for that
    /// fetch to answer.
    Cancelling {
        /// Attempt that was running.
        attempt: u32,
    },

    /// Fetched, not yet persisted.
    Delivered { body: String },

    /// Fetched and persisted.
    Stored { body: String },

    /// Gave up after the last allowed attempt.
    Failed { error: String },

    Cancelled,
}

impl PackageStatus {
    /// True while a fetch or retry timer is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Requested { .. } | Self::WaitingRetry { .. } | Self::Cancelling { .. }
        )
    }

    /// Package contents, once fetched.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Delivered { body } | Self::Stored { body } => Some(body),
            _ => None,
        }
    }
}

/// Postcodes known to a fresh post office.
pub fn default_postcodes() -> BTreeMap<City, ResourceId> {
    [
        ("Berlin", "10115"),
        ("London", "EC1A"),
        ("Paris", "75001"),
        ("Tokyo", "100-0001"),
    ]
    .into_iter()
    .map(|(city, code)| (City::from(city), ResourceId::from(code)))
    .collect()
}

/// Whole application state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostOffice {
    /// Letters per city, in arrival order.
    pub mailboxes: BTreeMap<City, Vec<String>>,
    pub postcodes: BTreeMap<City, ResourceId>,
    pub packages: BTreeMap<ResourceId, PackageStatus>,
    pub retry: RetryPolicy,
    /// Last clock reading delivered by the host, in Unix milliseconds.
    pub clock_ms: Option<u64>,
    /// Confirmed beer orders.
    pub beers_ordered: u32,
    /// Most recent failure or rejected input.
    pub last_error: Option<String>,
}

impl AppState for PostOffice {}

impl Default for PostOffice {
    fn default() -> Self {
        Self::new(default_postcodes(), RetryPolicy::default())
    }
}

impl PostOffice {
    pub fn new(postcodes: BTreeMap<City, ResourceId>, retry: RetryPolicy) -> Self {
        Self {
            mailboxes: BTreeMap::new(),
            postcodes,
            packages: BTreeMap::new(),
            retry,
            clock_ms: None,
            beers_ordered: 0,
            last_error: None,
        }
    }

    /// Letters received for `city`, oldest first.
    pub fn mailbox(&self, city: &City) -> &[String] {
        self.mailboxes.get(city).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn postcode(&self, city: &City) -> Option<&ResourceId> {
        self.postcodes.get(city)
    }

    pub fn package(&self, id: &ResourceId) -> Option<&PackageStatus> {
        self.packages.get(id)
    }
}
