//! Pool storage: the append-only commitment ledger and the nullifier set.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::hash::hash_pair;
use crate::{Commitment, Nullifier};

// =============================================================================
//                               COMMITMENT LEDGER
// =============================================================================

/// Ordered deposit commitments. Proofs claim inclusion against a prefix of
/// this sequence, so index order is part of the protocol.
///
/// Duplicates are accepted: collisions are the proving scheme's concern.
///
/// Serialized as the bare commitment list. The digest is rebuilt on load.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Vec<Commitment>", into = "Vec<Commitment>")]
pub struct CommitmentLedger {
    commitments: Vec<Commitment>,
    /// Running hash chain over every commitment appended so far:
    ///   digest_0 = 0, digest_{n+1} = keccak256(digest_n ++ commitment_n)
    digest: B256,
}

impl CommitmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commitment, returning its index.
    pub fn append(&mut self, commitment: Commitment) -> u64 {
        let index = self.commitments.len() as u64;
        self.commitments.push(commitment);
        self.digest = hash_pair(&self.digest, &commitment);
        index
    }

    pub fn len(&self) -> u64 {
        self.commitments.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.commitments.is_empty()
    }

    pub fn get(&self, index: u64) -> Option<Commitment> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.commitments.get(i))
            .copied()
    }

    pub fn as_slice(&self) -> &[Commitment] {
        &self.commitments
    }

    /// First index holding `commitment`. Provers use this to locate their
    /// deposit in a snapshot.
    pub fn position(&self, commitment: &Commitment) -> Option<u64> {
        self.commitments
            .iter()
            .position(|c| c == commitment)
            .map(|i| i as u64)
    }

    /// Digest of the whole ledger as it stands.
    pub fn digest(&self) -> B256 {
        self.digest
    }
}

impl From<Vec<Commitment>> for CommitmentLedger {
    fn from(commitments: Vec<Commitment>) -> Self {
        let mut ledger = Self::new();
        for commitment in commitments {
            ledger.append(commitment);
        }
        ledger
    }
}

impl From<CommitmentLedger> for Vec<Commitment> {
    fn from(ledger: CommitmentLedger) -> Self {
        ledger.commitments
    }
}

// =============================================================================
//                                 NULLIFIER SET
// =============================================================================

/// Spent nullifiers. A nullifier goes absent → present exactly once.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NullifierSet {
    spent: BTreeSet<Nullifier>,
}

impl NullifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, nullifier: &Nullifier) -> bool {
        self.spent.contains(nullifier)
    }

    /// Mark a nullifier spent. Returns false if it already was.
    pub fn insert(&mut self, nullifier: Nullifier) -> bool {
        self.spent.insert(nullifier)
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Nullifier> {
        self.spent.iter()
    }

    /// Clear a mark made earlier in the same aborted operation.
    pub(crate) fn unmark(&mut self, nullifier: &Nullifier) {
        self.spent.remove(nullifier);
    }
}
