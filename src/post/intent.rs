//! Intents for the post office.

use serde::{Deserialize, Serialize};

use crate::mvi::Intent;

use super::state::{City, ResourceId};

/// Everything that can happen to the post office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum PostIntent {
    /// A letter arrived for a city.
    LetterArrived { city: City, content: String },

    /// Someone asked for the package waiting in a city.
    RetrievePackage { city: City },

    /// Someone no longer wants the package.
    CancelRetrieval { city: City },

    /// Someone asked what time it is.
    CheckClock,

    /// Host input that decodes to nothing else.
    Unrecognized { raw: String },

    /// A fetch completed.
    ResourceFetched { id: ResourceId, body: String },

    /// A fetch failed.
    ResourceFetchFailed { id: ResourceId, error: String },

    /// A running fetch was aborted.
    FetchCancelled { id: ResourceId },

    /// The retry timer for a fetch elapsed.
    RetryDue { id: ResourceId },

    /// The host clock was read.
    ClockRead { unix_ms: u64 },

    PackagePersisted { id: ResourceId },

    PersistFailed { id: ResourceId, error: String },

    BeerOrdered,

    BeerOrderFailed { error: String },
}

impl Intent for PostIntent {}

impl PostIntent {
    /// Decode one line of host input.
    ///
    /// Returns `None` for blank lines and `#` comments. Lines that match
    /// no command become [`PostIntent::Unrecognized`].
    ///
    /// ```text
    /// letter <city> <content...>
    /// retrieve <city>
    /// cancel <city>
    /// clock
    /// ```
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let intent = match (command, rest) {
            ("letter", rest) => match rest.split_once(char::is_whitespace) {
                Some((city, content)) => PostIntent::LetterArrived {
                    city: City::from(city),
                    content: content.trim().to_string(),
                },
                None => Self::unrecognized(line),
            },
            ("retrieve", city) if is_single_word(city) => PostIntent::RetrievePackage {
                city: City::from(city),
            },
            ("cancel", city) if is_single_word(city) => PostIntent::CancelRetrieval {
                city: City::from(city),
            },
            ("clock", "") => PostIntent::CheckClock,
            _ => Self::unrecognized(line),
        };
        Some(intent)
    }

    fn unrecognized(line: &str) -> Self {
        PostIntent::Unrecognized {
            raw: line.to_string(),
        }
    }

    /// True for intents produced by the interpreter rather than the host.
    pub fn is_effect_result(&self) -> bool {
        !matches!(
            self,
            Self::LetterArrived { .. }
                | Self::RetrievePackage { .. }
                | Self::CancelRetrieval { .. }
                | Self::CheckClock
                | Self::Unrecognized { .. }
        )
    }
}

fn is_single_word(s: &str) -> bool {
    !s.is_empty() && !s.contains(char::is_whitespace)
}
