//! Oracle publisher
//!
//! Turns a stability index into a signed contract call and waits for it to
//! be mined. Gas is a fixed policy, never estimated. Every error on the way
//! collapses into [`PublishOutcome::Failed`] so a bad publication cannot
//! stop the schedule.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{TxHash, U256};
use tokio::time::Instant;
use tracing::{debug, error, info};

use super::{OracleChain, OracleTransaction, PublishError, PublishOutcome, GWEI};
use crate::index::StabilityIndex;

/// Fixed gas parameters for oracle updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
    pub gas_limit: u64,
    pub gas_price_gwei: u64,
}

impl GasPolicy {
    pub fn gas_price_wei(&self) -> u128 {
        u128::from(self.gas_price_gwei) * GWEI
    }
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            gas_limit: 200_000,
            gas_price_gwei: 50,
        }
    }
}

/// How long and how often to poll for the receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Publishes stability index updates through an [`OracleChain`].
pub struct OraclePublisher {
    chain: Arc<dyn OracleChain>,
    gas: GasPolicy,
    receipt: ReceiptPolicy,
}

impl OraclePublisher {
    pub fn new(chain: Arc<dyn OracleChain>, gas: GasPolicy, receipt: ReceiptPolicy) -> Self {
        Self { chain, gas, receipt }
    }

    /// Build the update transaction for a scaled value and nonce.
    pub fn build_transaction(&self, scaled: u64, nonce: u64) -> OracleTransaction {
        OracleTransaction {
            from: self.chain.sender(),
            to: self.chain.contract(),
            nonce,
            gas_limit: self.gas.gas_limit,
            gas_price: self.gas.gas_price_wei(),
            value: U256::from(scaled),
        }
    }

    /// Publish the index. Never fails; errors are logged and reported.
    pub async fn publish(&self, index: StabilityIndex) -> PublishOutcome {
        match self.try_publish(index).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Error updating stability oracle");
                PublishOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_publish(&self, index: StabilityIndex) -> Result<PublishOutcome, PublishError> {
        let scaled = index.scaled();
        let nonce = self.chain.nonce().await?;
        let tx = self.build_transaction(scaled, nonce);

        let tx_hash = self.chain.send(&tx).await?;
        info!(
            tx_hash = %tx_hash,
            nonce,
            scaled,
            "Sent transaction to update stability oracle"
        );

        if self.wait_for_receipt(tx_hash).await? {
            info!(tx_hash = %tx_hash, "Stability oracle updated successfully");
            Ok(PublishOutcome::Confirmed { tx_hash, scaled })
        } else {
            error!(tx_hash = %tx_hash, "Stability oracle transaction reverted");
            Ok(PublishOutcome::Reverted { tx_hash, scaled })
        }
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<bool, PublishError> {
        let started = Instant::now();

        loop {
            if let Some(status) = self.chain.receipt_status(tx_hash).await? {
                return Ok(status);
            }

            if started.elapsed() >= self.receipt.timeout {
                return Err(PublishError::ReceiptTimeout {
                    tx_hash,
                    waited_secs: started.elapsed().as_secs(),
                });
            }

            debug!(tx_hash = %tx_hash, "Receipt not available yet");
            tokio::time::sleep(self.receipt.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::compute_index;
    use crate::oracle::MockChain;

    fn fast_receipts() -> ReceiptPolicy {
        ReceiptPolicy {
            timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_gas_policy_defaults() {
        let gas = GasPolicy::default();
        assert_eq!(gas.gas_limit, 200_000);
        assert_eq!(gas.gas_price_wei(), 50_000_000_000);
    }

    #[tokio::test]
    async fn test_publish_confirmed() {
        let chain = Arc::new(MockChain::new().with_nonce(12).with_receipts(vec![None, Some(true)]));
        let publisher = OraclePublisher::new(chain.clone(), GasPolicy::default(), fast_receipts());

        let outcome = publisher.publish(compute_index(20.0, 50.0)).await;

        assert!(outcome.is_confirmed());
        assert_eq!(outcome.tx_hash(), Some(chain.tx_hash()));

        let sent = chain.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].nonce, 12);
        assert_eq!(sent[0].gas_limit, 200_000);
        assert_eq!(sent[0].gas_price, 50 * GWEI);
        assert_eq!(sent[0].value, U256::from(320_000u64));
        assert_eq!(sent[0].from, chain.sender());
        assert_eq!(sent[0].to, chain.contract());
    }

    #[tokio::test]
    async fn test_publish_reverted() {
        let chain = Arc::new(MockChain::new().with_receipts(vec![Some(false)]));
        let publisher = OraclePublisher::new(chain.clone(), GasPolicy::default(), fast_receipts());

        let outcome = publisher.publish(compute_index(0.0, 50.0)).await;

        assert_eq!(
            outcome,
            PublishOutcome::Reverted {
                tx_hash: chain.tx_hash(),
                scaled: 200_000
            }
        );
    }

    #[tokio::test]
    async fn test_nonce_failure_is_not_fatal() {
        let chain = Arc::new(
            MockChain::new().with_nonce_error(PublishError::Rpc("connection refused".into())),
        );
        let publisher = OraclePublisher::new(chain.clone(), GasPolicy::default(), fast_receipts());

        let outcome = publisher.publish(compute_index(20.0, 50.0)).await;

        match outcome {
            PublishOutcome::Failed { reason } => assert!(reason.contains("connection refused")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(chain.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_failure_is_not_fatal() {
        let chain = Arc::new(
            MockChain::new().with_send_error(PublishError::Broadcast("insufficient funds".into())),
        );
        let publisher = OraclePublisher::new(chain, GasPolicy::default(), fast_receipts());

        let outcome = publisher.publish(compute_index(20.0, 50.0)).await;
        assert!(matches!(outcome, PublishOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_receipt_timeout() {
        let chain = Arc::new(MockChain::new().with_receipts(vec![]));
        let publisher = OraclePublisher::new(chain.clone(), GasPolicy::default(), fast_receipts());

        let outcome = publisher.publish(compute_index(20.0, 50.0)).await;

        match outcome {
            PublishOutcome::Failed { reason } => assert!(reason.contains("No receipt")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(chain.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_gas_policy() {
        let chain = Arc::new(MockChain::new().with_receipts(vec![Some(true)]));
        let gas = GasPolicy {
            gas_limit: 90_000,
            gas_price_gwei: 3,
        };
        let publisher = OraclePublisher::new(chain.clone(), gas, fast_receipts());

        publisher.publish(compute_index(100.0, 100.0)).await;

        let sent = chain.sent().await;
        assert_eq!(sent[0].gas_limit, 90_000);
        assert_eq!(sent[0].gas_price, 3_000_000_000);
        assert_eq!(sent[0].value, U256::from(1_000_000u64));
    }
}
