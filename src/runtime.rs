//! Serial update loop.
//!
//! One intent at a time is reduced, and the resulting command is handed to
//! the interpreter. Interpreter results come back through the same loop,
//! so state transitions are totally ordered and never interleave.

use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::interpreter::{Host, Interpreter};
use crate::mvi::{Effect, Reducer};
use crate::post::{Cmd, PostIntent, PostOffice, PostReducer};
use crate::shutdown::ShutdownHandle;

/// One reducer invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub intent: PostIntent,
    pub cmd: Cmd,
}

/// Owns the state and drives the reducer / interpreter loop.
pub struct Runtime<H: Host> {
    state: PostOffice,
    interpreter: Interpreter<H>,
    results: mpsc::UnboundedReceiver<PostIntent>,
    transcript: Option<Vec<Transition>>,
}

impl<H: Host> Runtime<H> {
    pub fn new(state: PostOffice, host: Arc<H>) -> Self {
        let (outbox, results) = mpsc::unbounded_channel();
        Self {
            state,
            interpreter: Interpreter::new(host, outbox),
            results,
            transcript: None,
        }
    }

    /// Record every transition for later inspection.
    pub fn with_transcript(mut self) -> Self {
        self.transcript = Some(Vec::new());
        self
    }

    pub fn state(&self) -> &PostOffice {
        &self.state
    }

    pub fn interpreter(&self) -> &Interpreter<H> {
        &self.interpreter
    }

    /// Transitions recorded so far. Empty unless [`Self::with_transcript`] was used.
    pub fn transcript(&self) -> &[Transition] {
        self.transcript.as_deref().unwrap_or(&[])
    }

    /// Reduce one intent and dispatch the resulting command.
    ///
    /// Must be called inside a tokio runtime.
    pub fn step(&mut self, intent: PostIntent) -> Cmd {
        let previous_error = self.state.last_error.clone();
        let state = std::mem::take(&mut self.state);
        let (state, cmd) = PostReducer::reduce(state, intent.clone());
        self.state = state;

        tracing::debug!(
            intent = ?intent,
            cmd = cmd.kind(),
            from_effect = intent.is_effect_result(),
            "Transition"
        );
        if self.state.last_error != previous_error {
            if let Some(error) = &self.state.last_error {
                tracing::warn!(error = %error, "Post office reported an error");
            }
        }

        if let Some(transcript) = &mut self.transcript {
            transcript.push(Transition {
                intent,
                cmd: cmd.clone(),
            });
        }

        if !cmd.is_none() {
            self.interpreter.dispatch(cmd.clone());
        }
        cmd
    }

    /// Process intents until the loop drains or shutdown is signalled.
    ///
    /// Drained means `inputs` is closed, no effect is running and no effect
    /// result is waiting. On shutdown, running effects are aborted.
    pub async fn run(
        mut self,
        mut inputs: mpsc::Receiver<PostIntent>,
        shutdown: ShutdownHandle,
    ) -> RunOutcome {
        let mut inputs_open = true;
        let mut processed = 0usize;
        let mut interrupted = false;

        loop {
            if !inputs_open && self.interpreter.is_idle() && self.results.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = shutdown.wait() => {
                    self.interpreter.abort_all();
                    interrupted = true;
                    break;
                }

                Some(intent) = self.results.recv() => {
                    self.step(intent);
                    processed += 1;
                }

                input = inputs.recv(), if inputs_open => match input {
                    Some(intent) => {
                        self.step(intent);
                        processed += 1;
                    }
                    None => {
                        tracing::debug!("Host input closed, draining effects");
                        inputs_open = false;
                    }
                },

                _ = self.interpreter.idle(), if !inputs_open => {}
            }
        }

        tracing::info!(processed, interrupted, "Runtime stopped");
        RunOutcome {
            state: self.state,
            transcript: self.transcript.unwrap_or_default(),
            interrupted,
        }
    }
}

/// What [`Runtime::run`] hands back.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub state: PostOffice,
    pub transcript: Vec<Transition>,
    /// True when the loop stopped because of shutdown rather than draining.
    pub interrupted: bool,
}

/// Decode host input lines and send them to a running loop.
///
/// Input that is not valid UTF-8 is decoded lossily, so a damaged line
/// becomes [`PostIntent::Unrecognized`] and the lines after it still
/// arrive. Returns the number of intents sent. Stops early if the loop
/// has stopped listening.
pub async fn feed_lines<R: AsyncBufRead + Unpin>(
    mut reader: R,
    tx: &mpsc::Sender<PostIntent>,
) -> std::io::Result<usize> {
    let mut buf = Vec::new();
    let mut sent = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let Some(intent) = PostIntent::parse_line(&String::from_utf8_lossy(&buf)) else {
            continue;
        };
        if tx.send(intent).await.is_err() {
            break;
        }
        sent += 1;
    }
    Ok(sent)
}
