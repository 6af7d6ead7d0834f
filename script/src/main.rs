//! Local tooling for the fixed-denomination privacy pool.
//!
//! Subcommands:
//!   secret        - Generate a deposit secret, its commitment and nullifier
//!   encode-claim  - ABI-encode withdrawal public inputs
//!   decode-claim  - Decode withdrawal public inputs to JSON
//!   simulate      - Run deposits and relayed withdrawals against an in-memory pool
//!
//! `simulate` uses the development digest verifier, not a real proof system.

mod config;

use std::path::PathBuf;

use alloy_primitives::{Address, B256, U256};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use privacy_pool_lib::{
    Balances, DepositNote, DigestVerifier, Pool, PoolConfig, PoolError, PoolState,
    RecentBlocks, WithdrawalClaim,
};
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pool")]
#[command(about = "Tooling for the fixed-denomination privacy pool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh deposit secret
    Secret,
    /// ABI-encode a withdrawal claim (the proof's public inputs)
    EncodeClaim {
        #[arg(long)]
        nullifier: B256,
        #[arg(long)]
        block_number: u64,
        #[arg(long)]
        block_hash: B256,
        /// Association set root; omit when no set is used
        #[arg(long)]
        exclusion_set_root: Option<B256>,
        #[arg(long, default_value = "0")]
        relayer_fee: U256,
        #[arg(long)]
        recipient: Address,
        /// Omit for self-submitted withdrawals
        #[arg(long)]
        relayer: Option<Address>,
        /// Address of the pool the claim is bound to
        #[arg(long)]
        pool: Address,
    },
    /// Decode hex-encoded withdrawal public inputs
    DecodeClaim {
        /// Hex string, with or without 0x prefix
        public_inputs: String,
    },
    /// Deposit and withdraw notes against an in-memory pool
    Simulate {
        /// Path to a JSON PoolConfig (falls back to POOL_* env vars)
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "3")]
        deposits: usize,
        #[arg(long, default_value = "0")]
        relayer_fee: U256,
    },
}

#[derive(serde::Serialize)]
struct SecretOutput {
    secret: B256,
    commitment: B256,
    nullifier: B256,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Secret => {
            let secret: [u8; 32] = rand::thread_rng().gen();
            let note = DepositNote::new(B256::from(secret));
            let output = SecretOutput {
                secret: note.secret,
                commitment: note.commitment(),
                nullifier: note.nullifier(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::EncodeClaim {
            nullifier,
            block_number,
            block_hash,
            exclusion_set_root,
            relayer_fee,
            recipient,
            relayer,
            pool,
        } => {
            let claim = WithdrawalClaim {
                nullifier,
                block_hash,
                exclusion_set_root: exclusion_set_root.unwrap_or(B256::ZERO),
                relayer_fee,
                recipient,
                relayer: relayer.unwrap_or(Address::ZERO),
                contract_address: pool,
                block_number,
            };
            println!("0x{}", hex::encode(claim.encode()));
        }
        Commands::DecodeClaim { public_inputs } => {
            let claim = decode_claim_hex(&public_inputs)?;
            println!("{}", serde_json::to_string_pretty(&claim)?);
        }
        Commands::Simulate {
            config,
            deposits,
            relayer_fee,
        } => {
            let config = config::load(config.as_deref())?;
            simulate(config, deposits, relayer_fee)?;
        }
    }

    Ok(())
}

fn decode_claim_hex(s: &str) -> Result<WithdrawalClaim> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).context("invalid hex")?;
    WithdrawalClaim::decode(&bytes).context("not a withdrawal claim")
}

fn simulate(config: PoolConfig, deposits: usize, relayer_fee: U256) -> Result<()> {
    let mut rng = rand::thread_rng();
    let pool = Pool::new(config, DigestVerifier);
    let denomination = pool.config().denomination;
    let vkey = pool.config().verification_key;
    let mut state = PoolState::new();
    let mut blocks = RecentBlocks::default();
    let mut balances = Balances::new();
    let relayer = Address::from(rng.gen::<[u8; 20]>());

    // ── Deposits ───────────────────────────────────────────────────────
    let mut notes = Vec::with_capacity(deposits);
    for _ in 0..deposits {
        let note = DepositNote::new(B256::from(rng.gen::<[u8; 32]>()));
        let index = pool.deposit(&mut state, note.commitment(), denomination)?;
        info!(index, commitment = %note.commitment(), "deposited");
        notes.push(note);
    }
    let (block_number, block_hash) = blocks.seal(state.commitments())?;
    info!(block_number, %block_hash, leaves = state.commitments().len(), "sealed block");

    // ── Withdrawals ────────────────────────────────────────────────────
    let mut first_submission = None;
    for note in &notes {
        let recipient = Address::from(rng.gen::<[u8; 20]>());
        let claim = WithdrawalClaim {
            nullifier: note.nullifier(),
            block_hash,
            exclusion_set_root: B256::ZERO,
            relayer_fee,
            recipient,
            relayer,
            contract_address: pool.config().address,
            block_number,
        };
        let public_inputs = claim.encode();
        let proof = DigestVerifier::prove(&vkey, &public_inputs);
        pool.withdraw(
            &mut state,
            &blocks,
            &mut balances,
            &public_inputs,
            proof.as_slice(),
        )?;
        println!(
            "withdrew to {recipient}: recipient +{}, relayer +{relayer_fee}",
            balances.balance_of(&recipient)
        );
        if first_submission.is_none() {
            first_submission = Some((public_inputs, proof));
        }
    }

    // ── Replay ─────────────────────────────────────────────────────────
    if let Some((public_inputs, proof)) = first_submission {
        match pool.withdraw(
            &mut state,
            &blocks,
            &mut balances,
            &public_inputs,
            proof.as_slice(),
        ) {
            Err(PoolError::AlreadySpent(nullifier)) => {
                println!("replay of {nullifier} rejected as already spent");
            }
            other => bail!("replay was not rejected as a double spend: {other:?}"),
        }
    }

    println!(
        "relayer {relayer} earned {}, pool custody {}",
        balances.balance_of(&relayer),
        state.custody()
    );
    println!("{}", serde_json::to_string_pretty(state.events())?);
    Ok(())
}
