//! Reducer trait for MVI architecture.

use super::effect::Effect;
use super::intent::Intent;
use super::state::AppState;

/// Reducer transforms state based on intents.
///
/// The reducer is the only place where state transitions happen.
/// It must be a pure function: (State, Intent) -> (State, Effect)
pub trait Reducer {
    /// The state type this reducer operates on.
    type State: AppState;

    /// The intent type this reducer handles.
    type Intent: Intent;

    /// The effect description type this reducer emits.
    type Effect: Effect;

    /// Process an intent and return the new state with exactly one effect.
    ///
    /// This must have no side effects. Use [`Effect::none`] when nothing
    /// should happen.
    fn reduce(state: Self::State, intent: Self::Intent) -> (Self::State, Self::Effect);
}
