//! Base trait for application state in MVI architecture.

/// Marker trait for state objects.
///
/// States should be:
/// - Immutable (Clone to create new states)
/// - Self-contained (all data the reducer needs)
/// - Comparable (PartialEq so tests can assert on whole states)
pub trait AppState: Clone + PartialEq + Default + Send + 'static {}
