use crate::client::NetworkConnection;
use crate::error::{ContractError, ContractResult};
use alloy::{
    consensus::{SignableTransaction, TxEnvelope, TxLegacy},
    eips::eip2718::Encodable2718,
    network::TxSignerSync,
    primitives::{Address, Bytes, TxHash, TxKind, U256},
    signers::local::PrivateKeySigner,
};
use log::{debug, warn};
use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicBool, Ordering},
};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub to: TxKind,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
    pub gas_price: u128,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    pub hash: TxHash,
    pub from: Address,
    pub nonce: u64,
    pub to: TxKind,
    /// EIP-2718 encoded payload, ready for eth_sendRawTransaction.
    pub raw: Bytes,
}

pub struct SigningIdentity {
    signer: PrivateKeySigner,
    next_nonce: Mutex<Option<u64>>,
    // A reserved nonce was never submitted; re-read the count on the next reservation.
    stale: AtomicBool,
}

/// A nonce taken from the identity's counter. Unless committed, dropping it
/// (error path or cancelled future) makes the next reservation resync with the node.
#[must_use]
pub struct NonceReservation<'a> {
    identity: &'a SigningIdentity,
    nonce: u64,
    committed: bool,
}

impl NonceReservation<'_> {
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for NonceReservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            warn!(
                "Nonce {} for {} was not submitted",
                self.nonce,
                self.identity.address()
            );
            self.identity.stale.store(true, Ordering::SeqCst);
        }
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl SigningIdentity {
    pub fn from_secret(secret: &str) -> ContractResult<Self> {
        let signer = PrivateKeySigner::from_str(secret.trim()).map_err(|_| {
            ContractError::InvalidCredential(
                "expected a 32 byte hex encoded private key".to_string(),
            )
        })?;
        Ok(Self {
            signer,
            next_nonce: Mutex::new(None),
            stale: AtomicBool::new(false),
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn sign(&self, tx: &UnsignedTransaction) -> ContractResult<SignedTransaction> {
        let mut legacy = TxLegacy {
            chain_id: Some(tx.chain_id),
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit.into(),
            to: tx.to,
            value: tx.value,
            input: tx.input.clone(),
        };
        let signature = self
            .signer
            .sign_transaction_sync(&mut legacy)
            .map_err(|e| ContractError::InvalidCredential(e.to_string()))?;
        let envelope = TxEnvelope::from(legacy.into_signed(signature));

        Ok(SignedTransaction {
            hash: *envelope.tx_hash(),
            from: self.address(),
            nonce: tx.nonce,
            to: tx.to,
            raw: envelope.encoded_2718().into(),
        })
    }

    /// The first reservation seeds the counter from the node's pending
    /// transaction count for this account.
    pub async fn reserve_nonce(
        &self,
        conn: &NetworkConnection,
    ) -> ContractResult<NonceReservation<'_>> {
        let mut next = self.next_nonce.lock().await;
        if self.stale.swap(false, Ordering::SeqCst) {
            *next = None;
        }
        let nonce = match *next {
            Some(nonce) => nonce,
            None => conn.acquire().transaction_count(self.address()).await?,
        };
        *next = Some(nonce + 1);
        debug!("Reserved nonce {nonce} for {}", self.address());
        Ok(NonceReservation {
            identity: self,
            nonce,
            committed: false,
        })
    }

    pub async fn reset_nonce(&self) {
        warn!("Resetting nonce counter for {}", self.address());
        self.stale.store(false, Ordering::SeqCst);
        *self.next_nonce.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockLedger, DEV_KEY};
    use alloy::eips::eip2718::Decodable2718;
    use anyhow::Result;
    use std::sync::Arc;

    #[test]
    fn test_from_secret_derives_address() -> Result<()> {
        let identity = SigningIdentity::from_secret(DEV_KEY)?;
        assert_eq!(
            identity.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>()?
        );
        assert!(!format!("{identity:?}").contains("ac0974bec"));
        Ok(())
    }

    #[test]
    fn test_malformed_secret_is_rejected() {
        for secret in ["", "0x1234", "not a key"] {
            assert!(matches!(
                SigningIdentity::from_secret(secret),
                Err(ContractError::InvalidCredential(_))
            ));
        }
    }

    #[test]
    fn test_sign_is_deterministic_and_decodable() -> Result<()> {
        let identity = SigningIdentity::from_secret(DEV_KEY)?;
        let tx = UnsignedTransaction {
            chain_id: 31337,
            nonce: 4,
            to: TxKind::Call(Address::repeat_byte(0x11)),
            value: U256::ZERO,
            input: Bytes::from_static(&[1, 2, 3]),
            gas_limit: 50_000,
            gas_price: 1_000_000_000,
        };

        let first = identity.sign(&tx)?;
        let second = identity.sign(&tx)?;
        assert_eq!(first, second);
        assert_eq!(first.nonce, 4);

        let decoded = TxEnvelope::decode_2718(&mut first.raw.as_ref())?;
        assert_eq!(*decoded.tx_hash(), first.hash);
        Ok(())
    }

    #[tokio::test]
    async fn test_nonce_seeded_from_node_then_incremented() -> Result<()> {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_transaction_count(5);
        let conn = NetworkConnection::new(ledger.clone());
        let identity = SigningIdentity::from_secret(DEV_KEY)?;

        for expected in [5, 6] {
            let reservation = identity.reserve_nonce(&conn).await?;
            assert_eq!(reservation.nonce(), expected);
            reservation.commit();
        }
        assert_eq!(ledger.request_count(), 1);

        ledger.set_transaction_count(9);
        identity.reset_nonce().await;
        let reservation = identity.reserve_nonce(&conn).await?;
        assert_eq!(reservation.nonce(), 9);
        reservation.commit();
        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_reservation_rereads_count() -> Result<()> {
        let ledger = Arc::new(MockLedger::new());
        ledger.set_transaction_count(3);
        let conn = NetworkConnection::new(ledger.clone());
        let identity = SigningIdentity::from_secret(DEV_KEY)?;

        let reservation = identity.reserve_nonce(&conn).await?;
        assert_eq!(reservation.nonce(), 3);
        drop(reservation);

        let reservation = identity.reserve_nonce(&conn).await?;
        assert_eq!(reservation.nonce(), 3);
        reservation.commit();
        assert_eq!(ledger.request_count(), 2);

        let reservation = identity.reserve_nonce(&conn).await?;
        assert_eq!(reservation.nonce(), 4);
        reservation.commit();
        assert_eq!(ledger.request_count(), 2);
        Ok(())
    }
}
