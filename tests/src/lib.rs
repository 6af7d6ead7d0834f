#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, B256, U256};
    use privacy_pool_lib::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const UNIT: u64 = 1_000_000_000_000_000_000;

    fn config(denomination: u64) -> PoolConfig {
        PoolConfig {
            address: Address::repeat_byte(0x50),
            verification_key: B256::repeat_byte(0x77),
            denomination: U256::from(denomination),
        }
    }

    /// A pool with its environment: block history and account balances.
    struct World {
        pool: Pool<DigestVerifier>,
        state: PoolState,
        blocks: RecentBlocks,
        balances: Balances,
    }

    impl World {
        fn new(denomination: u64) -> Self {
            Self {
                pool: Pool::new(config(denomination), DigestVerifier),
                state: PoolState::new(),
                blocks: RecentBlocks::default(),
                balances: Balances::new(),
            }
        }

        fn deposit(&mut self, note: &DepositNote) -> u64 {
            let value = self.pool.config().denomination;
            self.pool
                .deposit(&mut self.state, note.commitment(), value)
                .unwrap()
        }

        /// Claim for `note`, anchored at a freshly sealed block.
        fn claim(&mut self, note: &DepositNote, recipient: Address, relayer: Address, fee: U256) -> WithdrawalClaim {
            let (block_number, block_hash) = self.blocks.seal(self.state.commitments()).unwrap();
            WithdrawalClaim {
                nullifier: note.nullifier(),
                block_hash,
                exclusion_set_root: B256::ZERO,
                relayer_fee: fee,
                recipient,
                relayer,
                contract_address: self.pool.config().address,
                block_number,
            }
        }

        fn withdraw(&mut self, claim: &WithdrawalClaim) -> Result<(), PoolError> {
            let inputs = claim.encode();
            let proof = DigestVerifier::prove(&self.pool.config().verification_key, &inputs);
            self.pool.withdraw(
                &mut self.state,
                &self.blocks,
                &mut self.balances,
                &inputs,
                proof.as_slice(),
            )
        }
    }

    fn random_note(rng: &mut StdRng) -> DepositNote {
        DepositNote::new(B256::from(rng.gen::<[u8; 32]>()))
    }

    fn random_address(rng: &mut StdRng) -> Address {
        Address::from(rng.gen::<[u8; 20]>())
    }

    #[test]
    fn test_single_unit_scenario() {
        let mut world = World::new(1);
        let note = DepositNote::new(B256::repeat_byte(0xC1));
        let c1 = note.commitment();

        assert_eq!(world.deposit(&note), 0);
        assert_eq!(world.state.commitments().as_slice(), &[c1]);

        let recipient = Address::repeat_byte(0xAA);
        let claim = world.claim(&note, recipient, Address::ZERO, U256::ZERO);
        world.withdraw(&claim).unwrap();

        assert_eq!(world.balances.balance_of(&recipient), U256::from(1));
        assert_eq!(world.balances.balance_of(&Address::ZERO), U256::ZERO);
        let spent: Vec<_> = world.state.nullifiers().iter().copied().collect();
        assert_eq!(spent, vec![note.nullifier()]);

        assert_eq!(
            world.withdraw(&claim),
            Err(PoolError::AlreadySpent(note.nullifier()))
        );
        assert_eq!(world.balances.balance_of(&recipient), U256::from(1));
    }

    #[test]
    fn test_ledger_length_and_order_after_n_deposits() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in [0usize, 1, 2, 17] {
            let mut world = World::new(UNIT);
            let notes: Vec<_> = (0..n).map(|_| random_note(&mut rng)).collect();
            for (i, note) in notes.iter().enumerate() {
                assert_eq!(world.deposit(note), i as u64);
            }
            let expected: Vec<_> = notes.iter().map(DepositNote::commitment).collect();
            assert_eq!(world.state.commitments().len(), n as u64);
            assert_eq!(world.state.commitments().as_slice(), expected.as_slice());
            assert_eq!(world.state.custody(), U256::from(UNIT) * U256::from(n as u64));
        }
    }

    #[test]
    fn test_wrong_deposit_value_never_mutates() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut world = World::new(UNIT);
        world.deposit(&random_note(&mut rng));
        let before = world.state.clone();
        for _ in 0..50 {
            let value = U256::from(rng.gen::<u64>());
            if value == U256::from(UNIT) {
                continue;
            }
            let result = world
                .pool
                .deposit(&mut world.state, random_note(&mut rng).commitment(), value);
            assert!(matches!(result, Err(PoolError::InvalidDepositAmount { .. })));
        }
        assert_eq!(world.state, before);
    }

    #[test]
    fn test_value_conservation_across_fees() {
        let mut rng = StdRng::seed_from_u64(42);
        let denomination = 1_000u64;
        let mut world = World::new(denomination);
        let relayer = random_address(&mut rng);
        let mut relayer_total = U256::ZERO;

        let mut fees: Vec<u64> = vec![0, denomination];
        fees.extend((0..30).map(|_| rng.gen_range(0..=denomination)));

        for fee in fees {
            let note = random_note(&mut rng);
            world.deposit(&note);
            let recipient = random_address(&mut rng);
            let claim = world.claim(&note, recipient, relayer, U256::from(fee));
            let relayer_before = world.balances.balance_of(&relayer);

            world.withdraw(&claim).unwrap();

            let got = world.balances.balance_of(&recipient);
            let relayer_delta = world.balances.balance_of(&relayer) - relayer_before;
            assert_eq!(got, U256::from(denomination - fee));
            assert_eq!(relayer_delta, U256::from(fee));
            assert_eq!(got + relayer_delta, U256::from(denomination));
            relayer_total += relayer_delta;
        }
        assert_eq!(world.balances.balance_of(&relayer), relayer_total);
        assert_eq!(world.state.custody(), U256::ZERO);
    }

    #[test]
    fn test_mismatched_block_hash_always_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut world = World::new(UNIT);
        let note = random_note(&mut rng);
        world.deposit(&note);
        let claim = world.claim(&note, random_address(&mut rng), Address::ZERO, U256::ZERO);

        for _ in 0..20 {
            let mut forged = claim.clone();
            forged.block_hash = B256::from(rng.gen::<[u8; 32]>());
            // The proof is valid for the forged inputs; the hash still is not.
            assert_eq!(
                world.withdraw(&forged),
                Err(PoolError::StaleOrInvalidBlockReference {
                    number: claim.block_number
                })
            );
        }
        assert!(!world.state.is_spent(&note.nullifier()));
        world.withdraw(&claim).unwrap();
    }

    #[test]
    fn test_evicted_block_is_permanently_stale() {
        let mut world = World::new(UNIT);
        world.blocks = RecentBlocks::new(4);
        let note = DepositNote::new(B256::repeat_byte(5));
        world.deposit(&note);
        let claim = world.claim(&note, Address::repeat_byte(0xAA), Address::ZERO, U256::ZERO);
        for _ in 0..4 {
            world.blocks.seal(world.state.commitments()).unwrap();
        }
        assert_eq!(
            world.withdraw(&claim),
            Err(PoolError::StaleOrInvalidBlockReference {
                number: claim.block_number
            })
        );
    }

    #[test]
    fn test_recipient_failure_leaves_nullifier_unseen() {
        let mut world = World::new(UNIT);
        let note = DepositNote::new(B256::repeat_byte(9));
        world.deposit(&note);
        let recipient = Address::repeat_byte(0xAA);
        let claim = world.claim(&note, recipient, Address::repeat_byte(0xBB), U256::from(10));
        let before = world.state.clone();

        world.balances.refuse(recipient);
        assert_eq!(
            world.withdraw(&claim),
            Err(PoolError::TransferFailed {
                to: recipient,
                reason: TransferError::Rejected,
            })
        );
        assert_eq!(world.state, before);
        assert!(!world.state.is_spent(&note.nullifier()));

        // Resubmission succeeds once the recipient accepts.
        world.balances.accept(recipient);
        world.withdraw(&claim).unwrap();
        assert!(world.state.is_spent(&note.nullifier()));
        assert_eq!(world.balances.balance_of(&recipient), U256::from(UNIT - 10));
    }

    #[test]
    fn test_zero_fee_skips_relayer_transfer() {
        let mut world = World::new(UNIT);
        let note = DepositNote::new(B256::repeat_byte(4));
        world.deposit(&note);
        let relayer = Address::repeat_byte(0xBB);
        // A refusing relayer does not matter when it is owed nothing.
        world.balances.refuse(relayer);
        let claim = world.claim(&note, Address::repeat_byte(0xAA), relayer, U256::ZERO);
        world.withdraw(&claim).unwrap();
        assert_eq!(world.balances.balance_of(&relayer), U256::ZERO);
    }

    #[test]
    fn test_proof_for_other_pool_is_not_replayable() {
        let mut world = World::new(UNIT);
        let note = DepositNote::new(B256::repeat_byte(6));
        world.deposit(&note);
        let mut claim = world.claim(&note, Address::repeat_byte(0xAA), Address::ZERO, U256::ZERO);
        claim.contract_address = Address::repeat_byte(0x51);
        assert!(matches!(
            world.withdraw(&claim),
            Err(PoolError::PoolIdentityMismatch { .. })
        ));
    }

    #[test]
    fn test_claim_blob_tampering_breaks_proof() {
        let mut world = World::new(UNIT);
        let note = DepositNote::new(B256::repeat_byte(8));
        world.deposit(&note);
        let claim = world.claim(&note, Address::repeat_byte(0xAA), Address::ZERO, U256::ZERO);
        let inputs = claim.encode();
        let proof = DigestVerifier::prove(&world.pool.config().verification_key, &inputs);

        // Redirect the payout after proving.
        let mut redirected = claim.clone();
        redirected.recipient = Address::repeat_byte(0xEE);
        let result = world.pool.withdraw(
            &mut world.state,
            &world.blocks,
            &mut world.balances,
            &redirected.encode(),
            proof.as_slice(),
        );
        assert_eq!(result, Err(PoolError::ProofInvalid));
    }

    /// Observes pool state from inside the payout, the way reentrant
    /// collaborator code would.
    struct Observer {
        nullifier: Nullifier,
        seen_spent: Option<bool>,
        inner: Balances,
    }

    impl ValueTransfer for Observer {
        fn credit(&mut self, to: Address, amount: U256, state: &PoolState) -> Result<(), TransferError> {
            self.seen_spent = Some(state.is_spent(&self.nullifier));
            self.inner.credit(to, amount, state)
        }

        fn reverse(&mut self, to: Address, amount: U256) {
            self.inner.reverse(to, amount)
        }
    }

    #[test]
    fn test_nullifier_marked_before_payout() {
        let mut world = World::new(UNIT);
        let note = DepositNote::new(B256::repeat_byte(2));
        world.deposit(&note);
        let claim = world.claim(&note, Address::repeat_byte(0xAA), Address::ZERO, U256::ZERO);
        let inputs = claim.encode();
        let proof = DigestVerifier::prove(&world.pool.config().verification_key, &inputs);

        let mut observer = Observer {
            nullifier: note.nullifier(),
            seen_spent: None,
            inner: Balances::new(),
        };
        world
            .pool
            .withdraw(&mut world.state, &world.blocks, &mut observer, &inputs, proof.as_slice())
            .unwrap();
        assert_eq!(observer.seen_spent, Some(true));
    }

    #[test]
    fn test_withdrawal_event_fields() {
        let mut world = World::new(UNIT);
        let note = DepositNote::new(B256::repeat_byte(1));
        world.deposit(&note);
        let mut claim = world.claim(&note, Address::repeat_byte(0xAA), Address::repeat_byte(0xBB), U256::from(5));

        let mut set = AssociationSetTree::new(8);
        set.insert(note.commitment()).unwrap();
        claim.exclusion_set_root = set.root();
        world.withdraw(&claim).unwrap();

        let last = world.state.events().last().cloned();
        assert_eq!(
            last,
            Some(PoolEvent::Withdrawal {
                nullifier: claim.nullifier,
                block_number: claim.block_number,
                block_hash: claim.block_hash,
                exclusion_set_root: claim.exclusion_set_root,
                recipient: claim.recipient,
                relayer: claim.relayer,
                relayer_fee: claim.relayer_fee,
            })
        );
    }

    #[test]
    fn test_claim_json_and_hex() {
        let claim = WithdrawalClaim {
            nullifier: B256::repeat_byte(0x11),
            block_hash: B256::repeat_byte(0x22),
            exclusion_set_root: B256::ZERO,
            relayer_fee: U256::from(UNIT),
            recipient: Address::repeat_byte(0xAA),
            relayer: Address::repeat_byte(0xBB),
            contract_address: Address::repeat_byte(0xCC),
            block_number: 21_000_000,
        };
        let json = serde_json::to_value(&claim).unwrap();
        for key in ["nullifier", "blockHash", "exclusionSetRoot", "relayerFee", "recipient", "relayer", "contractAddress", "blockNumber"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        let parsed: WithdrawalClaim = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, claim);

        let blob = hex::encode(claim.encode());
        assert_eq!(blob.len(), 2 * CLAIM_ENCODED_LEN);
        assert_eq!(WithdrawalClaim::decode(&hex::decode(blob).unwrap()).unwrap(), claim);
    }

    #[test]
    fn test_ledger_json_carries_only_commitments() {
        let a = B256::repeat_byte(0x0A);
        let b = B256::repeat_byte(0x0B);
        let mut ledger = CommitmentLedger::new();
        ledger.append(a);
        ledger.append(b);

        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json, serde_json::json!([a, b]));

        let restored: CommitmentLedger = serde_json::from_value(json).unwrap();
        assert_eq!(restored.digest(), hash_pair(&hash_pair(&B256::ZERO, &a), &b));
        assert_eq!(restored, ledger);
    }

    #[test]
    fn test_pool_state_survives_json() {
        let mut world = World::new(UNIT);
        let note = DepositNote::new(B256::repeat_byte(3));
        world.deposit(&note);
        let claim = world.claim(&note, Address::repeat_byte(0xAA), Address::ZERO, U256::ZERO);
        world.withdraw(&claim).unwrap();

        let json = serde_json::to_string(&world.state).unwrap();
        let restored: PoolState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, world.state);
        assert!(restored.is_spent(&note.nullifier()));
    }
}
