//! Oracle publication
//!
//! Pushes the scaled stability index to the oracle contract via
//! `setStabilityIndex(uint256)`.
//!
//! ## Flow
//!
//! 1. Fetch the sender's nonce from the node
//! 2. Build the call with the fixed gas limit and gas price
//! 3. Sign and broadcast
//! 4. Poll for the receipt and report its status
//!
//! [`OracleChain`] is the seam between the publisher and the network;
//! [`evm::EvmChain`] talks JSON-RPC, [`mock::MockChain`] is scripted.

pub mod evm;
pub mod mock;
pub mod publisher;

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;

pub use evm::EvmChain;
pub use mock::MockChain;
pub use publisher::{GasPolicy, OraclePublisher, ReceiptPolicy};

sol! {
    interface IStabilityOracle {
        function setStabilityIndex(uint256 index) external;
    }
}

/// Wei per gwei.
pub const GWEI: u128 = 1_000_000_000;

/// Errors raised while publishing to the oracle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PublishError {
    #[error("Signer error: {0}")]
    Signer(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Broadcast failed: {0}")]
    Broadcast(String),

    #[error("No receipt for {tx_hash} after {waited_secs}s")]
    ReceiptTimeout { tx_hash: TxHash, waited_secs: u64 },
}

/// Result of one publication attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// Mined with success status
    Confirmed { tx_hash: TxHash, scaled: u64 },
    /// Mined but reverted
    Reverted { tx_hash: TxHash, scaled: u64 },
    /// Never made it to a receipt
    Failed { reason: String },
    /// Dry run, nothing sent
    Skipped { scaled: u64 },
}

impl PublishOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PublishOutcome::Confirmed { .. })
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            PublishOutcome::Confirmed { tx_hash, .. } | PublishOutcome::Reverted { tx_hash, .. } => {
                Some(*tx_hash)
            }
            _ => None,
        }
    }
}

/// Oracle update transaction, before signing.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleTransaction {
    pub from: Address,
    pub to: Address,
    pub nonce: u64,
    pub gas_limit: u64,
    /// Legacy gas price in wei
    pub gas_price: u128,
    /// Scaled stability index argument
    pub value: U256,
}

impl OracleTransaction {
    /// ABI-encoded `setStabilityIndex(value)` call.
    pub fn calldata(&self) -> Bytes {
        IStabilityOracle::setStabilityIndexCall { index: self.value }
            .abi_encode()
            .into()
    }
}

/// Network access needed to publish the index.
#[async_trait]
pub trait OracleChain: Send + Sync {
    /// Address transactions are signed by.
    fn sender(&self) -> Address;

    /// Oracle contract address.
    fn contract(&self) -> Address;

    /// Current transaction count of the sender.
    async fn nonce(&self) -> Result<u64, PublishError>;

    /// Sign and broadcast, returning the transaction hash.
    async fn send(&self, tx: &OracleTransaction) -> Result<TxHash, PublishError>;

    /// Receipt status if mined: `Some(true)` success, `Some(false)` reverted.
    async fn receipt_status(&self, tx_hash: TxHash) -> Result<Option<bool>, PublishError>;
}
