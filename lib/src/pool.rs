//! The pool: deposit and withdrawal processing over an owned state object.
//!
//! Every operation is all-or-nothing. Withdrawals follow a two-phase commit:
//! the nullifier is marked spent before any value leaves the pool, and any
//! payout failure unwinds the mark together with every earlier payout.

use alloc::vec::Vec;
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::claim::WithdrawalClaim;
use crate::env::{BlockHistory, TransferError, ValueTransfer};
use crate::error::PoolError;
use crate::ledger::{CommitmentLedger, NullifierSet};
use crate::verifier::{ProofVerifier, VerificationKeyId};
use crate::{Commitment, Nullifier};

// =============================================================================
//                            CONFIGURATION AND STATE
// =============================================================================

/// Fixed at construction, immutable afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    /// This pool's identity. Claims must name it as `contractAddress`.
    pub address: Address,
    pub verification_key: VerificationKeyId,
    /// The only amount accepted per deposit and paid out per withdrawal.
    pub denomination: U256,
}

/// Notifications for off-chain provers and observers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PoolEvent {
    Deposit {
        commitment: Commitment,
        index: u64,
    },
    Withdrawal {
        nullifier: Nullifier,
        block_number: u64,
        block_hash: B256,
        exclusion_set_root: B256,
        recipient: Address,
        relayer: Address,
        relayer_fee: U256,
    },
}

/// Everything the pool persists besides its configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolState {
    commitments: CommitmentLedger,
    nullifiers: NullifierSet,
    custody: U256,
    events: Vec<PoolEvent>,
}

impl PoolState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commitments(&self) -> &CommitmentLedger {
        &self.commitments
    }

    pub fn nullifiers(&self) -> &NullifierSet {
        &self.nullifiers
    }

    pub fn is_spent(&self, nullifier: &Nullifier) -> bool {
        self.nullifiers.contains(nullifier)
    }

    /// Value currently held by the pool.
    pub fn custody(&self) -> U256 {
        self.custody
    }

    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }
}

// =============================================================================
//                            DEPOSIT AND WITHDRAWAL
// =============================================================================

/// A deployed pool instance: configuration plus the verifier it trusts.
#[derive(Clone, Debug)]
pub struct Pool<V> {
    config: PoolConfig,
    verifier: V,
}

impl<V: ProofVerifier> Pool<V> {
    pub fn new(config: PoolConfig, verifier: V) -> Self {
        Self { config, verifier }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Lock exactly one denomination against `commitment`. Returns the
    /// commitment's ledger index.
    pub fn deposit(
        &self,
        state: &mut PoolState,
        commitment: Commitment,
        value: U256,
    ) -> Result<u64, PoolError> {
        if value != self.config.denomination {
            warn!(%value, denomination = %self.config.denomination, "deposit rejected");
            return Err(PoolError::InvalidDepositAmount {
                expected: self.config.denomination,
                actual: value,
            });
        }

        let Some(custody) = state.custody.checked_add(value) else {
            warn!(%value, custody = %state.custody, "deposit rejected");
            return Err(PoolError::CustodyOverflow {
                custody: state.custody,
                value,
            });
        };

        let index = state.commitments.append(commitment);
        state.custody = custody;
        state.events.push(PoolEvent::Deposit { commitment, index });
        info!(%commitment, index, "deposit accepted");
        Ok(index)
    }

    /// Redeem one denomination for the holder of a proof over `public_inputs`.
    pub fn withdraw<H, T>(
        &self,
        state: &mut PoolState,
        history: &H,
        transfers: &mut T,
        public_inputs: &[u8],
        proof: &[u8],
    ) -> Result<(), PoolError>
    where
        H: BlockHistory + ?Sized,
        T: ValueTransfer + ?Sized,
    {
        let result = self
            .validate(state, history, public_inputs, proof)
            .and_then(|claim| self.settle(state, transfers, claim));
        if let Err(err) = &result {
            warn!(error = %err, "withdrawal rejected");
        }
        result
    }

    /// Every check that can run before state is touched.
    fn validate<H>(
        &self,
        state: &PoolState,
        history: &H,
        public_inputs: &[u8],
        proof: &[u8],
    ) -> Result<WithdrawalClaim, PoolError>
    where
        H: BlockHistory + ?Sized,
    {
        // 1. The proof must verify against this pool's key.
        if !self
            .verifier
            .verify(&self.config.verification_key, public_inputs, proof)
        {
            return Err(PoolError::ProofInvalid);
        }

        // 2. Decode what the proof attested to.
        let claim = WithdrawalClaim::decode(public_inputs)?;

        // 3. Double-spend guard.
        if state.is_spent(&claim.nullifier) {
            return Err(PoolError::AlreadySpent(claim.nullifier));
        }

        // 4. The claimed block must match the environment's own record.
        if history.block_hash(claim.block_number) != Some(claim.block_hash) {
            return Err(PoolError::StaleOrInvalidBlockReference {
                number: claim.block_number,
            });
        }

        // 5. No replay against another pool sharing the verification key.
        if claim.contract_address != self.config.address {
            return Err(PoolError::PoolIdentityMismatch {
                expected: self.config.address,
                claimed: claim.contract_address,
            });
        }

        if claim.relayer_fee > self.config.denomination {
            return Err(PoolError::RelayerFeeExceedsDenomination {
                fee: claim.relayer_fee,
                denomination: self.config.denomination,
            });
        }

        Ok(claim)
    }

    /// Mark, then pay. Unwind everything if a payout fails.
    fn settle<T>(
        &self,
        state: &mut PoolState,
        transfers: &mut T,
        claim: WithdrawalClaim,
    ) -> Result<(), PoolError>
    where
        T: ValueTransfer + ?Sized,
    {
        let denomination = self.config.denomination;
        let fee = claim.relayer_fee;
        let payout = denomination - fee;

        // Phase one: commit pool state.
        let custody_before = state.custody;
        state.nullifiers.insert(claim.nullifier);
        state.events.push(PoolEvent::Withdrawal {
            nullifier: claim.nullifier,
            block_number: claim.block_number,
            block_hash: claim.block_hash,
            exclusion_set_root: claim.exclusion_set_root,
            recipient: claim.recipient,
            relayer: claim.relayer,
            relayer_fee: fee,
        });
        let Some(remaining) = custody_before.checked_sub(denomination) else {
            rollback(state, &claim.nullifier, custody_before);
            return Err(PoolError::TransferFailed {
                to: claim.recipient,
                reason: TransferError::InsufficientCustody,
            });
        };
        state.custody = remaining;

        // Phase two: pay out.
        if let Err(reason) = transfers.credit(claim.recipient, payout, state) {
            rollback(state, &claim.nullifier, custody_before);
            return Err(PoolError::TransferFailed {
                to: claim.recipient,
                reason,
            });
        }

        if fee > U256::ZERO {
            if let Err(reason) = transfers.credit(claim.relayer, fee, state) {
                transfers.reverse(claim.recipient, payout);
                rollback(state, &claim.nullifier, custody_before);
                return Err(PoolError::TransferFailed {
                    to: claim.relayer,
                    reason,
                });
            }
        }

        info!(
            nullifier = %claim.nullifier,
            recipient = %claim.recipient,
            %payout,
            relayer_fee = %fee,
            "withdrawal settled"
        );
        Ok(())
    }
}

// =============================================================================
//                                   ROLLBACK
// =============================================================================

/// Undo phase one of `settle`.
fn rollback(state: &mut PoolState, nullifier: &Nullifier, custody: U256) {
    debug!(%nullifier, "rolling back withdrawal");
    state.nullifiers.unmark(nullifier);
    state.events.pop();
    state.custody = custody;
}
