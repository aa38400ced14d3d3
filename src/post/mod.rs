//! The post office: a pure core that never performs I/O.
//!
//! [`PostReducer`] maps `(PostOffice, PostIntent)` to `(PostOffice, Cmd)`.
//! Every side effect is a [`Cmd`] value handed to the interpreter.

mod effect;
mod intent;
mod reducer;
mod state;

pub use effect::Cmd;
pub use intent::PostIntent;
pub use reducer::PostReducer;
pub use state::{default_postcodes, City, PackageStatus, PostOffice, ResourceId, RetryPolicy};
