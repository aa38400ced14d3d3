//! Base trait for effect descriptions in MVI architecture.

use std::fmt::Debug;

/// Declarative description of a side effect.
///
/// Effects are returned by reducers and executed by an interpreter.
/// They must be comparable and printable so a test can assert on the
/// exact effect a reducer asked for.
pub trait Effect: Clone + PartialEq + Debug + Send + 'static {
    /// The "do nothing" effect.
    fn none() -> Self;

    /// True for the "do nothing" effect.
    fn is_none(&self) -> bool;
}
