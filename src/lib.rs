//! A post office built on the effect-description / interpreter split.
//!
//! - [`post`]: pure state, intents, commands and reducer
//! - [`interpreter`]: the only code that performs I/O
//! - [`runtime`]: the serial loop joining the two

pub mod cli;
pub mod config;
pub mod interpreter;
pub mod logging;
pub mod mvi;
pub mod post;
pub mod runtime;
pub mod shutdown;
