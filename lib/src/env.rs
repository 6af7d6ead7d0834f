//! Capabilities the pool borrows from its execution environment: block
//! history for anchoring claims, and value transfer for payouts.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec;
use alloc::vec::Vec;
use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

use crate::hash::keccak256_concat;
use crate::ledger::CommitmentLedger;
use crate::pool::PoolState;

// =============================================================================
//                                 BLOCK HISTORY
// =============================================================================

/// How many recent block hashes an EVM-style environment can look up.
pub const DEFAULT_HISTORY_WINDOW: usize = 256;

/// Ground truth for historical block hashes.
pub trait BlockHistory {
    /// Hash of block `number`, or `None` if it is in the future or has
    /// fallen out of the retained window.
    fn block_hash(&self, number: u64) -> Option<B256>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("expected block {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },
    #[error("block numbers exhausted")]
    Exhausted,
}

/// Application-maintained block history: the last `window` block hashes in
/// a circular buffer. Older blocks are evicted and can no longer anchor a
/// withdrawal.
#[derive(Clone, Debug)]
pub struct RecentBlocks {
    hashes: Vec<B256>,
    first_number: u64,
    next_number: u64,
}

impl Default for RecentBlocks {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl RecentBlocks {
    pub fn new(window: usize) -> Self {
        Self::starting_at(window, 0)
    }

    /// History whose first recorded block will be `number`.
    ///
    /// # Panics
    ///
    /// If `window` is zero.
    pub fn starting_at(window: usize, number: u64) -> Self {
        assert!(window > 0, "history window must hold at least one block");
        Self {
            hashes: vec![B256::ZERO; window],
            first_number: number,
            next_number: number,
        }
    }

    pub fn window(&self) -> usize {
        self.hashes.len()
    }

    /// Number the next recorded block will get.
    pub fn next_number(&self) -> u64 {
        self.next_number
    }

    /// Most recent block, if any.
    pub fn head(&self) -> Option<(u64, B256)> {
        let number = self.next_number.checked_sub(1)?;
        self.block_hash(number).map(|hash| (number, hash))
    }

    /// Append an externally observed block hash. Numbers must be consecutive.
    pub fn record(&mut self, number: u64, hash: B256) -> Result<(), HistoryError> {
        if number != self.next_number {
            return Err(HistoryError::OutOfOrder {
                expected: self.next_number,
                got: number,
            });
        }
        self.push(hash)
    }

    /// Close a block over the current ledger:
    ///   hash = keccak256(parent_hash ++ number_be_8bytes ++ ledger_digest)
    pub fn seal(&mut self, ledger: &CommitmentLedger) -> Result<(u64, B256), HistoryError> {
        let number = self.next_number;
        let parent = self.head().map(|(_, hash)| hash).unwrap_or(B256::ZERO);
        let hash = keccak256_concat(&[
            parent.as_slice(),
            &number.to_be_bytes(),
            ledger.digest().as_slice(),
        ]);
        self.push(hash)?;
        Ok((number, hash))
    }

    /// Store `hash` as block `next_number`. The last representable number
    /// is never used, so `next_number` always fits.
    fn push(&mut self, hash: B256) -> Result<(), HistoryError> {
        let next = self
            .next_number
            .checked_add(1)
            .ok_or(HistoryError::Exhausted)?;
        let slot = self.slot(self.next_number);
        self.hashes[slot] = hash;
        self.next_number = next;
        Ok(())
    }

    fn slot(&self, number: u64) -> usize {
        (number % self.hashes.len() as u64) as usize
    }
}

impl BlockHistory for RecentBlocks {
    fn block_hash(&self, number: u64) -> Option<B256> {
        if number < self.first_number || number >= self.next_number {
            return None;
        }
        if self.next_number - number > self.hashes.len() as u64 {
            return None;
        }
        Some(self.hashes[self.slot(number)])
    }
}

// =============================================================================
//                                VALUE TRANSFER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("recipient rejected the transfer")]
    Rejected,
    #[error("pool does not hold enough value")]
    InsufficientCustody,
    #[error("recipient balance would overflow")]
    BalanceOverflow,
}

/// Moves value out of the pool.
///
/// `credit` may run arbitrary collaborator code. It observes pool state as
/// committed so far, which already includes the spent nullifier.
pub trait ValueTransfer {
    fn credit(&mut self, to: Address, amount: U256, state: &PoolState) -> Result<(), TransferError>;

    /// Undo a credit accepted earlier in the same aborted operation.
    fn reverse(&mut self, to: Address, amount: U256);
}

/// In-memory account balances. Addresses can be told to refuse credits.
#[derive(Clone, Debug, Default)]
pub struct Balances {
    balances: BTreeMap<Address, U256>,
    refusing: BTreeSet<Address>,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, address: &Address) -> U256 {
        self.balances.get(address).copied().unwrap_or(U256::ZERO)
    }

    /// Make `address` reject every credit until `accept` is called.
    pub fn refuse(&mut self, address: Address) {
        self.refusing.insert(address);
    }

    pub fn accept(&mut self, address: Address) {
        self.refusing.remove(&address);
    }
}

impl ValueTransfer for Balances {
    fn credit(&mut self, to: Address, amount: U256, _state: &PoolState) -> Result<(), TransferError> {
        if self.refusing.contains(&to) {
            return Err(TransferError::Rejected);
        }
        let balance = self.balances.entry(to).or_insert(U256::ZERO);
        *balance = balance
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow)?;
        Ok(())
    }

    fn reverse(&mut self, to: Address, amount: U256) {
        if let Some(balance) = self.balances.get_mut(&to) {
            *balance = balance.saturating_sub(amount);
        }
    }
}
