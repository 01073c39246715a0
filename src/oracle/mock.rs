//! Mock oracle chain for testing.

use std::collections::VecDeque;

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{OracleChain, OracleTransaction, PublishError};

/// Scripted chain.
///
/// Hands out a fixed nonce and transaction hash, replays receipt statuses
/// in order (`None` once exhausted) and records every sent transaction.
pub struct MockChain {
    sender: Address,
    contract: Address,
    tx_hash: TxHash,
    nonce: Result<u64, PublishError>,
    send_error: Option<PublishError>,
    receipts: Mutex<VecDeque<Option<bool>>>,
    sent: Mutex<Vec<OracleTransaction>>,
}

impl MockChain {
    /// Chain that confirms the first transaction immediately.
    pub fn new() -> Self {
        Self {
            sender: Address::repeat_byte(0x11),
            contract: Address::repeat_byte(0x22),
            tx_hash: TxHash::repeat_byte(0xab),
            nonce: Ok(0),
            send_error: None,
            receipts: Mutex::new(VecDeque::from(vec![Some(true)])),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Ok(nonce);
        self
    }

    pub fn with_nonce_error(mut self, error: PublishError) -> Self {
        self.nonce = Err(error);
        self
    }

    pub fn with_send_error(mut self, error: PublishError) -> Self {
        self.send_error = Some(error);
        self
    }

    /// Receipt statuses returned by successive polls.
    pub fn with_receipts(mut self, receipts: Vec<Option<bool>>) -> Self {
        self.receipts = Mutex::new(receipts.into());
        self
    }

    /// Hash returned for every broadcast.
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Transactions broadcast so far.
    pub async fn sent(&self) -> Vec<OracleTransaction> {
        self.sent.lock().await.clone()
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OracleChain for MockChain {
    fn sender(&self) -> Address {
        self.sender
    }

    fn contract(&self) -> Address {
        self.contract
    }

    async fn nonce(&self) -> Result<u64, PublishError> {
        self.nonce.clone()
    }

    async fn send(&self, tx: &OracleTransaction) -> Result<TxHash, PublishError> {
        if let Some(e) = &self.send_error {
            return Err(e.clone());
        }
        self.sent.lock().await.push(tx.clone());
        Ok(self.tx_hash)
    }

    async fn receipt_status(&self, _tx_hash: TxHash) -> Result<Option<bool>, PublishError> {
        Ok(self.receipts.lock().await.pop_front().flatten())
    }
}
