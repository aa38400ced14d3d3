//! Model-View-Intent (MVI) primitives with declarative effects.
//!
//! This module provides the base traits for unidirectional data flow in
//! which side effects are returned as data instead of being performed.
//!
//! # Architecture
//!
//! ```text
//! Intent ──→ Reducer ──→ (State, Effect) ──→ Interpreter
//!    ↑                                            │
//!    └────────────────────────────────────────────┘
//! ```
//!
//! - **State**: Immutable representation of application state
//! - **Intent**: Something that happened outside the reducer
//! - **Effect**: Inspectable description of a side effect to perform
//! - **Reducer**: Pure function that transforms state based on intents

mod effect;
mod intent;
mod reducer;
mod state;

pub use effect::Effect;
pub use intent::Intent;
pub use reducer::Reducer;
pub use state::AppState;
