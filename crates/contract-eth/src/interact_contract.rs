use crate::client::{CallRequest, ConfirmationPolicy, NetworkConnection, TransactionReceipt};
use crate::error::{ContractError, ContractResult};
use crate::interface::{is_read_only, InterfaceDescription};
use crate::signer::{SigningIdentity, UnsignedTransaction};
use alloy::{
    dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt},
    primitives::{Address, Bytes, TxHash, TxKind, U256},
};
use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

#[async_trait]
pub trait ContractInteract {
    async fn call(&self, method: &str, args: &[DynSolValue]) -> ContractResult<DynSolValue>;

    async fn send(&self, method: &str, args: &[DynSolValue])
        -> ContractResult<TransactionReceipt>;
}

#[derive(Clone)]
pub struct ContractBinding {
    address: Option<Address>,
    interface: InterfaceDescription,
    connection: NetworkConnection,
    signer: Option<Arc<SigningIdentity>>,
    confirmation: ConfirmationPolicy,
}

impl ContractBinding {
    pub fn new(
        address: Address,
        interface: InterfaceDescription,
        connection: NetworkConnection,
        signer: Option<Arc<SigningIdentity>>,
    ) -> Self {
        Self {
            address: Some(address),
            interface,
            connection,
            signer,
            confirmation: ConfirmationPolicy::default(),
        }
    }

    pub fn unbound(
        interface: InterfaceDescription,
        connection: NetworkConnection,
        signer: Option<Arc<SigningIdentity>>,
    ) -> Self {
        Self {
            address: None,
            interface,
            connection,
            signer,
            confirmation: ConfirmationPolicy::default(),
        }
    }

    pub fn with_confirmation_policy(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    pub fn interface(&self) -> &InterfaceDescription {
        &self.interface
    }

    pub fn connection(&self) -> &NetworkConnection {
        &self.connection
    }

    fn target(&self) -> ContractResult<Address> {
        self.address.ok_or(ContractError::NotDeployed)
    }

    pub async fn send_with_value(
        &self,
        method: &str,
        args: &[DynSolValue],
        value: U256,
    ) -> ContractResult<TransactionReceipt> {
        let address = self.target()?;
        let function = self.interface.function(method, args.len())?;
        let signer = self
            .signer
            .as_deref()
            .ok_or_else(|| ContractError::Unauthorized(method.to_string()))?;

        let input = function.abi_encode_input(args)?;
        let tx_hash = self
            .submit(signer, TxKind::Call(address), input.into(), value)
            .await?;
        info!("Sent {method} to {address}: {tx_hash}");
        self.confirm(tx_hash).await
    }

    /// Build, sign and submit a transaction. The nonce is committed only once
    /// the node accepts the transaction.
    pub(crate) async fn submit(
        &self,
        signer: &SigningIdentity,
        to: TxKind,
        input: Bytes,
        value: U256,
    ) -> ContractResult<TxHash> {
        let chain_id = self.connection.chain_id().await?;
        let estimate = CallRequest {
            from: Some(signer.address()),
            to,
            input: input.clone(),
            value,
        };
        let gas_limit = self.connection.acquire().estimate_gas(&estimate).await?;
        let gas_price = self.connection.acquire().gas_price().await?;

        let reservation = signer.reserve_nonce(&self.connection).await?;
        let signed = signer.sign(&UnsignedTransaction {
            chain_id,
            nonce: reservation.nonce(),
            to,
            value,
            input,
            gas_limit,
            gas_price,
        })?;

        let tx_hash = self
            .connection
            .acquire()
            .send_raw_transaction(&signed)
            .await?;
        debug!("Submitted {tx_hash} with nonce {}", reservation.nonce());
        reservation.commit();
        Ok(tx_hash)
    }

    pub(crate) async fn confirm(&self, tx_hash: TxHash) -> ContractResult<TransactionReceipt> {
        let receipt = self
            .connection
            .wait_for_receipt(tx_hash, &self.confirmation)
            .await?;
        if !receipt.status {
            return Err(ContractError::TransactionReverted(tx_hash));
        }
        info!(
            "Transaction {tx_hash} confirmed in block {}",
            receipt.block_number.unwrap_or_default()
        );
        Ok(receipt)
    }
}

#[async_trait]
impl ContractInteract for ContractBinding {
    async fn call(&self, method: &str, args: &[DynSolValue]) -> ContractResult<DynSolValue> {
        let address = self.target()?;
        let function = self.interface.function(method, args.len())?;
        if !is_read_only(function) {
            return Err(ContractError::NotReadOnly(method.to_string()));
        }

        let request = CallRequest {
            from: self.signer.as_ref().map(|signer| signer.address()),
            to: TxKind::Call(address),
            input: function.abi_encode_input(args)?.into(),
            value: U256::ZERO,
        };
        debug!("Calling {method} on {address}");
        let output = self.connection.acquire().call(&request).await?;

        let mut values = function.abi_decode_output(&output, true)?;
        Ok(if values.len() == 1 {
            values.remove(0)
        } else {
            DynSolValue::Tuple(values)
        })
    }

    async fn send(
        &self,
        method: &str,
        args: &[DynSolValue],
    ) -> ContractResult<TransactionReceipt> {
        self.send_with_value(method, args, U256::ZERO).await
    }
}
