//! JSON-RPC oracle chain
//!
//! Signs locally with a private key and talks to the configured node over
//! HTTP. The provider fills the chain id; nonce, gas limit and gas price
//! always come from the publisher.

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::info;

use super::{OracleChain, OracleTransaction, PublishError};

/// Oracle chain backed by an Ethereum JSON-RPC node.
pub struct EvmChain {
    provider: DynProvider,
    sender: Address,
    contract: Address,
}

impl EvmChain {
    /// Build a signing provider for `rpc_url`.
    ///
    /// No request is made here; the first RPC call happens when publishing.
    pub fn connect(
        rpc_url: &str,
        private_key: &str,
        contract: Address,
    ) -> Result<Self, PublishError> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| PublishError::Signer(format!("Invalid private key: {}", e)))?;
        let sender = signer.address();

        let url = reqwest::Url::parse(rpc_url)
            .map_err(|e| PublishError::Rpc(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        info!(sender = %sender, contract = %contract, "Oracle chain client ready");

        Ok(Self {
            provider,
            sender,
            contract,
        })
    }
}

#[async_trait]
impl OracleChain for EvmChain {
    fn sender(&self) -> Address {
        self.sender
    }

    fn contract(&self) -> Address {
        self.contract
    }

    async fn nonce(&self) -> Result<u64, PublishError> {
        self.provider
            .get_transaction_count(self.sender)
            .await
            .map_err(|e| PublishError::Rpc(format!("Failed to fetch nonce: {}", e)))
    }

    async fn send(&self, tx: &OracleTransaction) -> Result<TxHash, PublishError> {
        let request = TransactionRequest::default()
            .with_from(tx.from)
            .with_to(tx.to)
            .with_input(tx.calldata())
            .with_nonce(tx.nonce)
            .with_gas_limit(tx.gas_limit)
            .with_gas_price(tx.gas_price);

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| PublishError::Broadcast(e.to_string()))?;

        Ok(*pending.tx_hash())
    }

    async fn receipt_status(&self, tx_hash: TxHash) -> Result<Option<bool>, PublishError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| PublishError::Rpc(format!("Failed to fetch receipt: {}", e)))?;

        Ok(receipt.map(|r| r.status()))
    }
}
