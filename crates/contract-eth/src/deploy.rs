use crate::client::{ConfirmationPolicy, NetworkConnection, TransactionReceipt};
use crate::error::{ContractError, ContractResult};
use crate::interact_contract::ContractBinding;
use crate::interface::ContractArtifact;
use crate::signer::SigningIdentity;
use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    primitives::{Address, TxHash, TxKind, U256},
};
use log::info;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentResult {
    pub address: Address,
    pub transaction_hash: TxHash,
    pub receipt: TransactionReceipt,
}

pub struct DeploymentClient {
    connection: NetworkConnection,
    signer: Arc<SigningIdentity>,
    confirmation: ConfirmationPolicy,
}

impl DeploymentClient {
    pub fn new(connection: NetworkConnection, signer: Arc<SigningIdentity>) -> Self {
        Self {
            connection,
            signer,
            confirmation: ConfirmationPolicy::default(),
        }
    }

    pub fn with_confirmation_policy(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// Create a new instance of `artifact` and wait until the creation is confirmed.
    pub async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &[DynSolValue],
    ) -> ContractResult<DeploymentResult> {
        let bytecode = artifact.bytecode.as_ref().ok_or_else(|| {
            ContractError::Artifact(format!("{} has no creation bytecode", artifact.name()))
        })?;

        let mut input = bytecode.to_vec();
        match artifact.interface.constructor() {
            Some(constructor) if constructor.inputs.len() == constructor_args.len() => {
                input.extend(constructor.abi_encode_input(constructor_args)?);
            }
            None if constructor_args.is_empty() => {}
            constructor => {
                return Err(ContractError::Arity {
                    method: "constructor".to_string(),
                    expected: constructor.map_or(0, |c| c.inputs.len()).to_string(),
                    got: constructor_args.len(),
                })
            }
        }

        let binding = ContractBinding::unbound(
            artifact.interface.clone(),
            self.connection.clone(),
            Some(self.signer.clone()),
        )
        .with_confirmation_policy(self.confirmation);

        info!(
            "Deploying {} from {}",
            artifact.name(),
            self.signer.address()
        );
        let tx_hash = binding
            .submit(&self.signer, TxKind::Create, input.into(), U256::ZERO)
            .await
            .map_err(|e| match e {
                ContractError::RemoteExecution(reason) => ContractError::DeploymentRejected(reason),
                other => other,
            })?;
        let receipt = binding.confirm(tx_hash).await?;
        let address = receipt.contract_address.ok_or_else(|| {
            ContractError::DeploymentRejected(format!(
                "receipt of {tx_hash} carries no contract address"
            ))
        })?;

        info!("[🚀]{} deployed to {address}", artifact.name());
        Ok(DeploymentResult {
            address,
            transaction_hash: tx_hash,
            receipt,
        })
    }

    pub fn bind(&self, artifact: &ContractArtifact, result: &DeploymentResult) -> ContractBinding {
        ContractBinding::new(
            result.address,
            artifact.interface.clone(),
            self.connection.clone(),
            Some(self.signer.clone()),
        )
        .with_confirmation_policy(self.confirmation)
    }
}
