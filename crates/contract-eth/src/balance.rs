use crate::client::NetworkConnection;
use crate::error::ContractResult;
use alloy::primitives::{utils::format_ether, Address, U256};
use async_trait::async_trait;

#[async_trait]
pub trait Balance: Sync {
    async fn get_balance(&self, address: Address) -> ContractResult<U256>;

    /// Balance rendered in ether, e.g. `1.500000000000000000`.
    async fn get_balance_in_ether(&self, address: Address) -> ContractResult<String> {
        Ok(format_ether(self.get_balance(address).await?))
    }
}

#[async_trait]
impl Balance for NetworkConnection {
    async fn get_balance(&self, address: Address) -> ContractResult<U256> {
        self.acquire().balance(address).await
    }
}
