//! Effect descriptions emitted by the post office reducer.

use serde::{Deserialize, Serialize};

use crate::mvi::Effect;

use super::state::ResourceId;

/// A side effect the post office wants performed.
///
/// Nothing here is executed by the reducer; see [`crate::interpreter`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "args", rename_all = "snake_case")]
pub enum Cmd {
    #[default]
    None,

    /// Several commands, interpreted in order.
    Batch(Vec<Cmd>),

    /// Fetch the resource with this identifier.
    FetchResource { id: ResourceId },

    /// Abort a running fetch.
    CancelFetch { id: ResourceId },

    /// Wait, then report that a fetch may be retried.
    RetryAfter { id: ResourceId, delay_ms: u64 },

    /// Read the host clock.
    GetTime,

    /// Write a fetched package to storage.
    PersistPackage { id: ResourceId, body: String },

    OrderBeer,
}

impl Effect for Cmd {
    fn none() -> Self {
        Cmd::None
    }

    fn is_none(&self) -> bool {
        matches!(self, Cmd::None)
    }
}

impl Cmd {
    /// Combine commands into one.
    ///
    /// Nested batches are flattened and `None` is dropped. No commands
    /// collapse to `None`, a single command is returned as is.
    pub fn batch(cmds: impl IntoIterator<Item = Cmd>) -> Cmd {
        let mut leaves = Vec::new();
        for cmd in cmds {
            cmd.collect_leaves(&mut leaves);
        }
        match leaves.len() {
            0 => Cmd::None,
            1 => leaves.remove(0),
            _ => Cmd::Batch(leaves),
        }
    }

    /// Non-batch, non-`None` commands in execution order.
    pub fn leaves(self) -> Vec<Cmd> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves(self, out: &mut Vec<Cmd>) {
        match self {
            Cmd::None => {}
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    cmd.collect_leaves(out);
                }
            }
            leaf => out.push(leaf),
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Cmd::None => "none",
            Cmd::Batch(_) => "batch",
            Cmd::FetchResource { .. } => "fetch_resource",
            Cmd::CancelFetch { .. } => "cancel_fetch",
            Cmd::RetryAfter { .. } => "retry_after",
            Cmd::GetTime => "get_time",
            Cmd::PersistPackage { .. } => "persist_package",
            Cmd::OrderBeer => "order_beer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch(id: &str) -> Cmd {
        Cmd::FetchResource {
            id: ResourceId::from(id),
        }
    }

    #[test]
    fn empty_batch_is_none() {
        assert_eq!(Cmd::batch([]), Cmd::None);
        assert_eq!(Cmd::batch([Cmd::None, Cmd::Batch(vec![])]), Cmd::None);
    }

    #[test]
    fn single_batch_collapses() {
        assert_eq!(Cmd::batch([Cmd::None, Cmd::GetTime]), Cmd::GetTime);
    }

    #[test]
    fn nested_batches_flatten_in_order() {
        let cmd = Cmd::batch([
            fetch("a"),
            Cmd::Batch(vec![Cmd::GetTime, Cmd::Batch(vec![Cmd::OrderBeer])]),
            fetch("b"),
        ]);
        assert_eq!(
            cmd,
            Cmd::Batch(vec![fetch("a"), Cmd::GetTime, Cmd::OrderBeer, fetch("b")])
        );
    }

    #[test]
    fn leaves_skip_none() {
        let leaves = Cmd::Batch(vec![Cmd::None, Cmd::OrderBeer, Cmd::None]).leaves();
        assert_eq!(leaves, vec![Cmd::OrderBeer]);
        assert!(Cmd::None.leaves().is_empty());
    }

    #[test]
    fn serializes_as_tagged_data() {
        let json = serde_json::to_value(fetch("75001")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"cmd": "fetch_resource", "args": {"id": "75001"}})
        );
    }
}
