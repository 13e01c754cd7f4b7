//! # Sender State Machine
//!
//! ```text
//!   Init ──Start──► Invited ──Advance──► AwaitingConfirmation
//!                                          │            │
//!                        TxInitCompleted   │            │ TxInitCompleted (bad sig)
//!                        (valid sig)       ▼            │ TxFailed
//!                                      Confirmed        ▼
//!                                          │          Failed
//!                                   Advance│
//!                                          ▼
//!                           AwaitingOutputConfirmation ──TxOutputConfirmCompleted──► Completed
//! ```
//!
//! [`transition`] performs no I/O. It returns the next state together with
//! the [`Effect`]s the driver must execute, in order, before that state is
//! adopted. If a storage effect fails the driver feeds
//! [`Event::StorageFailed`] back into the *previous* state.
//!
//! A returned `Err` means the event was rejected and nothing changed.

use tracing::{info, warn};

use super::context::{Funding, TransactionContext};
use super::error::NegotiationError;
use super::messages::{
    Confirmation, Invitation, OutputConfirmation, TxFailed, TxInitCompleted,
    TxOutputConfirmCompleted,
};
use crate::config::NegotiationConfig;
use crate::transaction::{Coin, CoinId};
use crate::zkp::ProofSystem;

/// Where a negotiation stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SenderState {
    /// Nothing has happened yet.
    Init,
    /// Invitation sent. Transient.
    Invited,
    /// Waiting for the receiver's signature share.
    AwaitingConfirmation,
    /// Share verified and own share sent. Transient.
    Confirmed,
    /// Waiting for the final acknowledgement.
    AwaitingOutputConfirmation,
    /// Terminal success. Coin state is persisted.
    Completed,
    /// Terminal failure, with its cause.
    Failed(NegotiationError),
}

impl SenderState {
    /// `Completed` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }

    /// States the driver leaves immediately with [`Event::Advance`].
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Invited | Self::Confirmed)
    }

    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::Invited => "Invited",
            Self::AwaitingConfirmation => "AwaitingConfirmation",
            Self::Confirmed => "Confirmed",
            Self::AwaitingOutputConfirmation => "AwaitingOutputConfirmation",
            Self::Completed => "Completed",
            Self::Failed(_) => "Failed",
        }
    }
}

/// Inputs to the state machine.
#[derive(Debug)]
pub enum Event {
    /// Coins are locked and a change key derived: build and send.
    Start(Funding),
    /// Leave a transient state.
    Advance,
    /// The receiver's signature share arrived.
    TxInitCompleted(TxInitCompleted),
    /// The final acknowledgement arrived.
    TxOutputConfirmCompleted(TxOutputConfirmCompleted),
    /// The counterpart or the transport aborted.
    TxFailed(TxFailed),
    /// A storage effect of the last transition failed.
    StorageFailed(String),
}

impl Event {
    /// Short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "Start",
            Self::Advance => "Advance",
            Self::TxInitCompleted(_) => "TxInitCompleted",
            Self::TxOutputConfirmCompleted(_) => "TxOutputConfirmCompleted",
            Self::TxFailed(_) => "TxFailed",
            Self::StorageFailed(_) => "StorageFailed",
        }
    }
}

/// Side effects requested by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Durably store the unconfirmed change coin.
    StoreCoin(Coin),
    /// Send the invitation.
    SendInvitation(Invitation),
    /// Send the sender's partial signature.
    SendConfirmation(Confirmation),
    /// Ask for change-output confirmation.
    SendOutputConfirmation(OutputConfirmation),
    /// Unlock inputs and discard the unconfirmed change coin.
    ReleaseCoins {
        /// Locked inputs to return to `Unspent`.
        inputs: Vec<CoinId>,
        /// Unconfirmed change coin to forget.
        change: Option<CoinId>,
    },
    /// Durably write the settled coin set. Once per completed negotiation.
    PersistCoins(Vec<Coin>),
}

/// Result of a transition.
#[derive(Debug, PartialEq, Eq)]
pub struct Transition {
    /// State to adopt once every effect has succeeded.
    pub state: SenderState,
    /// Effects to execute, in order.
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: SenderState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(state: SenderState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

/// Read-only inputs a transition may use.
pub struct Environment<'a> {
    /// Kernel parameters.
    pub config: &'a NegotiationConfig,
    /// Commitment parameters and range prover.
    pub proofs: &'a ProofSystem,
}

/// Compute the next state and its effects.
///
/// `context` is `None` until `Start` has been processed, and is populated
/// by it.
pub fn transition(
    state: &SenderState,
    event: Event,
    context: &mut Option<TransactionContext>,
    env: &Environment<'_>,
) -> Result<Transition, NegotiationError> {
    use SenderState as S;

    match (state, event) {
        (S::Init, Event::Start(funding)) => Ok(init_tx(funding, context, env)),

        (S::Init, Event::StorageFailed(reason)) => {
            let ctx = context.as_ref().ok_or(NegotiationError::NotStarted)?;
            warn!(tx_id = %ctx.tx_id, %reason, "change coin could not be stored");
            Ok(Transition::with(
                S::Failed(NegotiationError::Storage(reason)),
                vec![rollback_tx(ctx)],
            ))
        }

        (S::Invited, Event::Advance) => Ok(Transition::to(S::AwaitingConfirmation)),

        (S::AwaitingConfirmation, Event::TxInitCompleted(share)) => {
            let ctx = started(context)?;
            check_tx_id(ctx, share.tx_id)?;

            if ctx.is_invalid_signature(&share) {
                warn!(tx_id = %ctx.tx_id, "counterpart partial signature rejected");
                return Ok(cancel_tx(ctx, NegotiationError::InvalidCounterpartSignature));
            }

            match ctx.confirm(&share) {
                Ok(confirmation) => {
                    info!(tx_id = %ctx.tx_id, "counterpart signature verified, confirming");
                    Ok(Transition::with(
                        S::Confirmed,
                        vec![Effect::SendConfirmation(confirmation)],
                    ))
                }
                Err(NegotiationError::NonceConsumed) => Err(NegotiationError::NonceConsumed),
                Err(cause) => Ok(cancel_tx(ctx, cause)),
            }
        }

        (S::AwaitingConfirmation, Event::TxFailed(failure)) => {
            let ctx = started(context)?;
            check_tx_id(ctx, failure.tx_id)?;
            warn!(tx_id = %ctx.tx_id, reason = %failure.reason, "counterpart aborted");
            Ok(cancel_tx(
                ctx,
                NegotiationError::CounterpartFailed(failure.reason),
            ))
        }

        (S::Confirmed, Event::Advance) => {
            let ctx = started(context)?;
            Ok(Transition::with(
                S::AwaitingOutputConfirmation,
                vec![Effect::SendOutputConfirmation(OutputConfirmation {
                    tx_id: ctx.tx_id,
                })],
            ))
        }

        // Once our share is out there is no cancellation path.
        (S::Confirmed | S::AwaitingOutputConfirmation, Event::TxFailed(failure)) => {
            let ctx = started(context)?;
            check_tx_id(ctx, failure.tx_id)?;
            warn!(
                tx_id = %ctx.tx_id,
                reason = %failure.reason,
                "abort after confirmation ignored"
            );
            Ok(Transition::to(state.clone()))
        }

        (S::AwaitingOutputConfirmation, Event::TxOutputConfirmCompleted(ack)) => {
            let ctx = started(context)?;
            check_tx_id(ctx, ack.tx_id)?;
            let settled = ctx.complete()?;
            Ok(Transition::with(
                S::Completed,
                vec![Effect::PersistCoins(settled)],
            ))
        }

        // Inputs may already be spent on the ledger; leave recovery to the keychain.
        (S::AwaitingOutputConfirmation, Event::StorageFailed(reason)) => {
            if let Some(ctx) = context.as_ref() {
                warn!(tx_id = %ctx.tx_id, %reason, "settled coins could not be persisted");
            }
            Ok(Transition::to(S::Failed(NegotiationError::Storage(reason))))
        }

        (state, event) => Err(NegotiationError::InvalidState {
            state: state.name(),
            event: event.name(),
        }),
    }
}

/// initTx: build the context, store the change coin, send the invitation.
fn init_tx(
    funding: Funding,
    context: &mut Option<TransactionContext>,
    env: &Environment<'_>,
) -> Transition {
    let tx_id = funding.tx_id;
    let inputs = funding.coin_ids();

    let ctx = match TransactionContext::prepare(funding, env.config, env.proofs) {
        Ok(ctx) => ctx,
        Err(cause) => {
            warn!(tx_id = %tx_id, error = %cause, "invitation could not be built");
            return Transition::with(
                SenderState::Failed(cause),
                vec![Effect::ReleaseCoins {
                    inputs,
                    change: None,
                }],
            );
        }
    };

    let mut effects = Vec::with_capacity(2);
    if let Some(change) = &ctx.change_coin {
        effects.push(Effect::StoreCoin(change.clone()));
    }
    effects.push(Effect::SendInvitation(ctx.invitation()));

    info!(
        tx_id = %tx_id,
        amount = ctx.amount,
        inputs = ctx.inputs.len(),
        "invitation ready"
    );
    *context = Some(ctx);
    Transition::with(SenderState::Invited, effects)
}

/// rollbackTx: the effect that undoes a negotiation's reservations.
fn rollback_tx(ctx: &TransactionContext) -> Effect {
    Effect::ReleaseCoins {
        inputs: ctx.input_ids(),
        change: ctx.change_coin.as_ref().map(|c| c.id),
    }
}

/// cancelTx: fail with `cause` and release everything.
fn cancel_tx(ctx: &TransactionContext, cause: NegotiationError) -> Transition {
    Transition::with(SenderState::Failed(cause), vec![rollback_tx(ctx)])
}

fn started(
    context: &mut Option<TransactionContext>,
) -> Result<&mut TransactionContext, NegotiationError> {
    context.as_mut().ok_or(NegotiationError::NotStarted)
}

fn check_tx_id(ctx: &TransactionContext, got: uuid::Uuid) -> Result<(), NegotiationError> {
    if ctx.tx_id != got {
        return Err(NegotiationError::TxIdMismatch {
            expected: ctx.tx_id,
            got,
        });
    }
    Ok(())
}
