use alloy::primitives::TxHash;
use std::time::Duration;

pub type ContractResult<T> = std::result::Result<T, ContractError>;

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Invalid signing credential: {0}")]
    InvalidCredential(String),

    #[error("Method `{0}` is not part of the contract interface")]
    MethodNotFound(String),

    #[error("Method `{method}` expects {expected} argument(s), got {got}")]
    Arity {
        method: String,
        expected: String,
        got: usize,
    },

    #[error("Remote execution failed: {0}")]
    RemoteExecution(String),

    #[error("Method `{0}` changes state and needs a signing identity")]
    Unauthorized(String),

    #[error("Transaction {0} reverted")]
    TransactionReverted(TxHash),

    #[error("Transaction {tx_hash} was not confirmed within {timeout:?}")]
    TransactionTimeout { tx_hash: TxHash, timeout: Duration },

    #[error("Deployment rejected: {0}")]
    DeploymentRejected(String),

    #[error("Method `{0}` is not read-only, use send instead")]
    NotReadOnly(String),

    #[error("Contract binding has no address yet")]
    NotDeployed,

    #[error("Invalid contract artifact: {0}")]
    Artifact(String),

    #[error("ABI error: {0}")]
    Abi(#[from] alloy::dyn_abi::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error occurred: {0}")]
    Io(#[from] std::io::Error),
}
