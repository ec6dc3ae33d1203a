#[cfg(feature = "balance")]
pub mod balance;
pub mod client;
pub mod config;
#[cfg(feature = "contract-interact")]
pub mod deploy;
pub mod error;
#[cfg(feature = "contract-interact")]
pub mod interact_contract;
pub mod interface;
pub mod signer;

#[cfg(test)]
mod mock;

pub use client::{ConfirmationPolicy, NetworkConnection, TransactionReceipt};
pub use config::ClientConfig;
pub use error::{ContractError, ContractResult};
pub use interface::{format_value, ContractArtifact, InterfaceDescription};
pub use signer::SigningIdentity;
