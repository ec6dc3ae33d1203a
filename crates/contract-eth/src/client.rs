use crate::error::{ContractError, ContractResult};
use crate::signer::SignedTransaction;
use alloy::{
    primitives::{Address, Bytes, TxHash, TxKind, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::{TransactionInput, TransactionRequest},
    transports::BoxTransport,
};
use async_trait::async_trait;
use log::{debug, info};
use std::{
    ops::Deref,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownNetwork {
    pub name: &'static str,
    pub chain_id: u64,
    alchemy_subdomain: Option<&'static str>,
}

pub const KNOWN_NETWORKS: &[KnownNetwork] = &[
    KnownNetwork {
        name: "mainnet",
        chain_id: 1,
        alchemy_subdomain: Some("eth-mainnet"),
    },
    KnownNetwork {
        name: "goerli",
        chain_id: 5,
        alchemy_subdomain: Some("eth-goerli"),
    },
    KnownNetwork {
        name: "sepolia",
        chain_id: 11155111,
        alchemy_subdomain: Some("eth-sepolia"),
    },
    KnownNetwork {
        name: "holesky",
        chain_id: 17000,
        alchemy_subdomain: Some("eth-holesky"),
    },
    KnownNetwork {
        name: "localhost",
        chain_id: 31337,
        alchemy_subdomain: None,
    },
];

const LOCALHOST_RPC: &str = "http://127.0.0.1:8545";

impl KnownNetwork {
    pub fn lookup(name: &str) -> ContractResult<Self> {
        KNOWN_NETWORKS
            .iter()
            .find(|network| network.name.eq_ignore_ascii_case(name.trim()))
            .copied()
            .ok_or_else(|| ContractError::Connection(format!("unrecognized network `{name}`")))
    }

    pub fn endpoint_url(&self, endpoint_credential: Option<&str>) -> ContractResult<String> {
        match self.alchemy_subdomain {
            None => Ok(LOCALHOST_RPC.to_string()),
            Some(subdomain) => {
                let key = endpoint_credential
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| {
                        ContractError::Connection(format!(
                            "network `{}` needs an endpoint API key",
                            self.name
                        ))
                    })?;
                Ok(format!("https://{subdomain}.g.alchemy.com/v2/{key}"))
            }
        }
    }
}

/// eth_call / eth_estimateGas request.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: TxKind,
    pub input: Bytes,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub contract_address: Option<Address>,
    pub gas_used: u64,
    pub status: bool,
}

/// The remote node as seen by the client. One method per round trip.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn chain_id(&self) -> ContractResult<u64>;
    async fn call(&self, request: &CallRequest) -> ContractResult<Bytes>;
    async fn estimate_gas(&self, request: &CallRequest) -> ContractResult<u64>;
    async fn gas_price(&self) -> ContractResult<u128>;
    async fn transaction_count(&self, address: Address) -> ContractResult<u64>;
    async fn balance(&self, address: Address) -> ContractResult<U256>;
    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> ContractResult<TxHash>;
    async fn transaction_receipt(&self, tx_hash: TxHash)
        -> ContractResult<Option<TransactionReceipt>>;
}

pub struct RpcLedger {
    provider: RootProvider<BoxTransport>,
}

impl RpcLedger {
    pub async fn connect(rpc_url: &str) -> ContractResult<Self> {
        let provider = ProviderBuilder::new()
            .on_builtin(rpc_url)
            .await
            .map_err(|e| ContractError::Connection(format!("endpoint unreachable: {e}")))?;
        Ok(Self { provider })
    }
}

fn to_rpc_request(request: &CallRequest) -> TransactionRequest {
    TransactionRequest {
        from: request.from,
        to: Some(request.to),
        value: Some(request.value),
        input: TransactionInput::new(request.input.clone()),
        ..Default::default()
    }
}

fn connection_error(e: impl std::fmt::Display) -> ContractError {
    ContractError::Connection(e.to_string())
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn chain_id(&self) -> ContractResult<u64> {
        self.provider.get_chain_id().await.map_err(connection_error)
    }

    async fn call(&self, request: &CallRequest) -> ContractResult<Bytes> {
        self.provider
            .call(&to_rpc_request(request))
            .await
            .map_err(|e| ContractError::RemoteExecution(e.to_string()))
    }

    async fn estimate_gas(&self, request: &CallRequest) -> ContractResult<u64> {
        self.provider
            .estimate_gas(&to_rpc_request(request))
            .await
            .map_err(|e| ContractError::RemoteExecution(e.to_string()))
    }

    async fn gas_price(&self) -> ContractResult<u128> {
        self.provider.get_gas_price().await.map_err(connection_error)
    }

    async fn transaction_count(&self, address: Address) -> ContractResult<u64> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(connection_error)
    }

    async fn balance(&self, address: Address) -> ContractResult<U256> {
        self.provider
            .get_balance(address)
            .await
            .map_err(connection_error)
    }

    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> ContractResult<TxHash> {
        let pending = self
            .provider
            .send_raw_transaction(&tx.raw)
            .await
            .map_err(|e| ContractError::RemoteExecution(e.to_string()))?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> ContractResult<Option<TransactionReceipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(connection_error)?;
        Ok(receipt.map(|receipt| TransactionReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            contract_address: receipt.contract_address,
            gas_used: receipt.gas_used as u64,
            status: receipt.status(),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Clone)]
pub struct NetworkConnection {
    ledger: Arc<dyn Ledger>,
    in_flight: Arc<AtomicUsize>,
    chain_id: Arc<OnceCell<u64>>,
}

impl NetworkConnection {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            in_flight: Arc::new(AtomicUsize::new(0)),
            chain_id: Arc::new(OnceCell::new()),
        }
    }

    /// Single attempt; the node must report the chain id of `network_name`.
    pub async fn connect(
        network_name: &str,
        endpoint_credential: Option<&str>,
    ) -> ContractResult<Self> {
        let network = KnownNetwork::lookup(network_name)?;
        let rpc_url = network.endpoint_url(endpoint_credential)?;
        let conn = Self::new(Arc::new(RpcLedger::connect(&rpc_url).await?));

        let chain_id = conn.chain_id().await?;
        if chain_id != network.chain_id {
            return Err(ContractError::Connection(format!(
                "endpoint for `{}` reports chain id {chain_id}, expected {}",
                network.name, network.chain_id
            )));
        }
        info!("Connected to {} (chain id {chain_id})", network.name);
        Ok(conn)
    }

    pub async fn connect_url(rpc_url: &str) -> ContractResult<Self> {
        let conn = Self::new(Arc::new(RpcLedger::connect(rpc_url).await?));
        let chain_id = conn.chain_id().await?;
        info!("Connected to custom endpoint (chain id {chain_id})");
        Ok(conn)
    }

    /// Released on drop, including when the owning future is cancelled.
    pub fn acquire(&self) -> ConnectionHandle<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        ConnectionHandle {
            ledger: &*self.ledger,
            in_flight: &self.in_flight,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn chain_id(&self) -> ContractResult<u64> {
        self.chain_id
            .get_or_try_init(|| async { self.acquire().chain_id().await })
            .await
            .copied()
    }

    pub async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        policy: &ConfirmationPolicy,
    ) -> ContractResult<TransactionReceipt> {
        tokio::time::timeout(policy.timeout, self.poll_receipt(tx_hash, policy.poll_interval))
            .await
            .map_err(|_| ContractError::TransactionTimeout {
                tx_hash,
                timeout: policy.timeout,
            })?
    }

    async fn poll_receipt(
        &self,
        tx_hash: TxHash,
        poll_interval: Duration,
    ) -> ContractResult<TransactionReceipt> {
        loop {
            if let Some(receipt) = self.acquire().transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            debug!("Transaction {tx_hash} still pending");
            tokio::time::sleep(poll_interval).await;
        }
    }
}

pub struct ConnectionHandle<'a> {
    ledger: &'a (dyn Ledger + 'static),
    in_flight: &'a AtomicUsize,
}

impl Deref for ConnectionHandle<'_> {
    type Target = dyn Ledger;

    fn deref(&self) -> &Self::Target {
        self.ledger
    }
}

impl Drop for ConnectionHandle<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
