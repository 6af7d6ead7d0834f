//! Association (inclusion / exclusion) set roots.
//!
//! A withdrawal may additionally attest that its commitment belongs to an
//! association set published by some third party. The proof commits to the
//! set root as `exclusionSetRoot`; an all-zero root means no set was used.

use alloc::vec;
use alloc::vec::Vec;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash::{hash_pair, keccak256};

/// Deepest supported tree: leaf indices are `u32`.
pub const MAX_SET_LEVELS: usize = 32;

// =============================================================================
//                               INCLUSION PROOFS
// =============================================================================

/// Inclusion branches and an index proving that a leaf is in a set.
///
/// Bit `i` of `index` says which side the running node sits on at level `i`:
/// 0 means left, so `parent = hash(node, sibling)`; 1 means right, so
/// `parent = hash(sibling, node)`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InclusionBranches {
    pub index: u32,
    pub proof: Vec<B256>,
}

/// Fold `leaf` up through `branches` to the set root.
pub fn compute_inclusion_root(leaf: B256, branches: &InclusionBranches) -> B256 {
    let mut root = leaf;
    for (level, sibling) in branches.proof.iter().enumerate() {
        let is_right = level < MAX_SET_LEVELS && branches.index & (1 << level) != 0;
        root = if is_right {
            hash_pair(sibling, &root)
        } else {
            hash_pair(&root, sibling)
        };
    }
    root
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("association set is full ({capacity} leaves)")]
pub struct SetFull {
    pub capacity: u64,
}

// =============================================================================
//                             ASSOCIATION SET TREE
// =============================================================================

/// Compute the zero values for each level of the tree.
///   zeros[0] = keccak256(bytes32(0))
///   zeros[i] = keccak256(zeros[i-1] ++ zeros[i-1])
/// `zeros[levels]` is the root of the empty tree.
pub fn compute_zeros(levels: usize) -> Vec<B256> {
    let mut zeros = vec![B256::ZERO; levels + 1];
    zeros[0] = keccak256(&[0u8; 32]);
    for i in 1..=levels {
        zeros[i] = hash_pair(&zeros[i - 1], &zeros[i - 1]);
    }
    zeros
}

/// Fixed-depth Merkle tree over an association set, padded with zero values.
/// Used by set publishers and provers to derive roots and branches.
#[derive(Clone, Debug)]
pub struct AssociationSetTree {
    levels: usize,
    zeros: Vec<B256>,
    leaves: Vec<B256>,
}

impl AssociationSetTree {
    pub fn new(levels: usize) -> Self {
        assert!(
            (1..=MAX_SET_LEVELS).contains(&levels),
            "association set depth must be within 1..={MAX_SET_LEVELS}"
        );
        Self {
            levels,
            zeros: compute_zeros(levels),
            leaves: Vec::new(),
        }
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.levels
    }

    pub fn leaves(&self) -> &[B256] {
        &self.leaves
    }

    /// Append a leaf, returning its index.
    pub fn insert(&mut self, leaf: B256) -> Result<u32, SetFull> {
        let index = self.leaves.len() as u64;
        if index >= self.capacity() {
            return Err(SetFull {
                capacity: self.capacity(),
            });
        }
        self.leaves.push(leaf);
        Ok(index as u32)
    }

    pub fn root(&self) -> B256 {
        let layers = self.layers();
        layers[self.levels]
            .first()
            .copied()
            .unwrap_or(self.zeros[self.levels])
    }

    /// Branches for the leaf at `index`, or `None` if no such leaf exists.
    pub fn branches(&self, index: u32) -> Option<InclusionBranches> {
        if index as usize >= self.leaves.len() {
            return None;
        }
        let layers = self.layers();
        let mut position = index as usize;
        let mut proof = Vec::with_capacity(self.levels);
        for (level, nodes) in layers.iter().take(self.levels).enumerate() {
            let sibling = nodes
                .get(position ^ 1)
                .copied()
                .unwrap_or(self.zeros[level]);
            proof.push(sibling);
            position /= 2;
        }
        Some(InclusionBranches { index, proof })
    }

    /// Every level of the populated part of the tree, leaves first. Odd
    /// levels are padded with that level's zero value before hashing up.
    fn layers(&self) -> Vec<Vec<B256>> {
        let mut layers = Vec::with_capacity(self.levels + 1);
        let mut current = self.leaves.clone();
        for level in 0..self.levels {
            if current.len() % 2 == 1 {
                current.push(self.zeros[level]);
            }
            let next = current
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], &pair[1]))
                .collect();
            layers.push(core::mem::replace(&mut current, next));
        }
        layers.push(current);
        layers
    }
}
