//! Reducer for the post office.

use crate::mvi::Reducer;

use super::effect::Cmd;
use super::intent::PostIntent;
use super::state::{City, PackageStatus, PostOffice, ResourceId};

/// Pure update function for [`PostOffice`].
pub struct PostReducer;

impl Reducer for PostReducer {
    type State = PostOffice;
    type Intent = PostIntent;
    type Effect = Cmd;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> (Self::State, Self::Effect) {
        let cmd = match intent {
            PostIntent::LetterArrived { city, content } => {
                state.mailboxes.entry(city).or_default().push(content);
                Cmd::OrderBeer
            }

            PostIntent::RetrievePackage { city } => retrieve(&mut state, &city),

            PostIntent::CancelRetrieval { city } => cancel(&mut state, &city),

            PostIntent::CheckClock => Cmd::GetTime,

            PostIntent::Unrecognized { raw } => {
                state.last_error = Some(format!("Unrecognized input: {}", raw));
                Cmd::None
            }

            PostIntent::ResourceFetched { id, body } => match state.packages.get(&id) {
                Some(PackageStatus::Requested { .. }) => {
                    state.packages.insert(
                        id.clone(),
                        PackageStatus::Delivered { body: body.clone() },
                    );
                    Cmd::batch([Cmd::PersistPackage { id, body }, Cmd::GetTime])
                }
                Some(PackageStatus::Cancelling { .. }) => settle_cancel(&mut state, id),
                _ => Cmd::None,
            },

            PostIntent::ResourceFetchFailed { id, error } => match state.packages.get(&id) {
                Some(PackageStatus::Requested { attempt }) => {
                    let attempt = *attempt;
                    if attempt < state.retry.max_attempts {
                        let delay_ms = state.retry.backoff_ms(attempt);
                        state
                            .packages
                            .insert(id.clone(), PackageStatus::WaitingRetry { attempt, error });
                        Cmd::RetryAfter { id, delay_ms }
                    } else {
                        state.last_error = Some(format!(
                            "Fetching {} failed after {} attempts: {}",
                            id, attempt, error
                        ));
                        state.packages.insert(id, PackageStatus::Failed { error });
                        Cmd::None
                    }
                }
                Some(PackageStatus::Cancelling { .. }) => settle_cancel(&mut state, id),
                _ => Cmd::None,
            },

            PostIntent::RetryDue { id } => match state.packages.get(&id) {
                Some(PackageStatus::WaitingRetry { attempt, .. }) => {
                    let attempt = attempt.saturating_add(1);
                    state
                        .packages
                        .insert(id.clone(), PackageStatus::Requested { attempt });
                    Cmd::FetchResource { id }
                }
                _ => Cmd::None,
            },

            PostIntent::FetchCancelled { id } => {
                if let Some(status) = state.packages.get_mut(&id) {
                    if status.is_in_flight() {
                        *status = PackageStatus::Cancelled;
                    }
                }
                Cmd::None
            }

            PostIntent::PackagePersisted { id } => {
                if let Some(PackageStatus::Delivered { body }) = state.packages.get(&id) {
                    let body = body.clone();
                    state.packages.insert(id, PackageStatus::Stored { body });
                }
                Cmd::None
            }

            PostIntent::PersistFailed { id, error } => {
                state.last_error = Some(format!("Storing {} failed: {}", id, error));
                Cmd::None
            }

            PostIntent::ClockRead { unix_ms } => {
                state.clock_ms = Some(unix_ms);
                Cmd::None
            }

            PostIntent::BeerOrdered => {
                state.beers_ordered = state.beers_ordered.saturating_add(1);
                Cmd::None
            }

            PostIntent::BeerOrderFailed { error } => {
                state.last_error = Some(format!("Beer order failed: {}", error));
                Cmd::None
            }
        };
        (state, cmd)
    }
}

fn retrieve(state: &mut PostOffice, city: &City) -> Cmd {
    let Some(id) = state.postcode(city).cloned() else {
        state.last_error = Some(format!("No postcode known for {}", city));
        return Cmd::None;
    };

    if state.packages.get(&id).is_some_and(PackageStatus::is_in_flight) {
        return Cmd::None;
    }

    state
        .packages
        .insert(id.clone(), PackageStatus::Requested { attempt: 1 });
    Cmd::FetchResource { id }
}

fn cancel(state: &mut PostOffice, city: &City) -> Cmd {
    let Some(id) = state.postcode(city).cloned() else {
        return Cmd::None;
    };

    let Some(status) = state.packages.get_mut(&id) else {
        return Cmd::None;
    };

    match status {
        // The fetch may already have answered; whichever result arrives
        // next settles the cancel.
        PackageStatus::Requested { attempt } => {
            let attempt = *attempt;
            *status = PackageStatus::Cancelling { attempt };
            Cmd::CancelFetch { id }
        }
        // Only a timer is pending; its RetryDue will be ignored.
        PackageStatus::WaitingRetry { .. } => {
            *status = PackageStatus::Cancelled;
            Cmd::None
        }
        _ => Cmd::None,
    }
}

/// A fetch answered after its cancel was requested.
fn settle_cancel(state: &mut PostOffice, id: ResourceId) -> Cmd {
    state.packages.insert(id, PackageStatus::Cancelled);
    Cmd::None
}
