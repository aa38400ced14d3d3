//! Base trait for intents (input events) in MVI architecture.

/// Marker trait for intent objects.
///
/// Intents represent:
/// - Host input (a letter arriving, a user asking for a package)
/// - Effect results (a fetch completing, a timer firing)
/// - Effect failures, which are intents like any other
///
/// Intents are processed by reducers to produce new states.
pub trait Intent: Send + 'static {}
