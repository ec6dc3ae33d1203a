//! In-memory ledger used by the unit tests.
use crate::client::{CallRequest, Ledger, TransactionReceipt};
use crate::error::{ContractError, ContractResult};
use crate::signer::SignedTransaction;
use alloy::primitives::{address, Address, Bytes, FixedBytes, TxHash, TxKind, U256};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Mutex,
    },
};

// Hardhat/anvil dev account #0.
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const DEPLOYED_ADDRESS: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

pub const MULTISIG_ARTIFACT: &str = r#"{
  "_format": "hh-sol-artifact-1",
  "contractName": "MultiSigWallet",
  "sourceName": "contracts/multisig_wallet.sol",
  "abi": [
    {
      "type": "constructor",
      "stateMutability": "nonpayable",
      "inputs": [
        { "name": "_owners", "type": "address[]", "internalType": "address[]" },
        { "name": "_required", "type": "uint256", "internalType": "uint256" }
      ]
    },
    {
      "type": "function",
      "name": "owners",
      "stateMutability": "view",
      "inputs": [{ "name": "", "type": "uint256", "internalType": "uint256" }],
      "outputs": [{ "name": "", "type": "address", "internalType": "address" }]
    },
    {
      "type": "function",
      "name": "required",
      "stateMutability": "view",
      "inputs": [],
      "outputs": [{ "name": "", "type": "uint256", "internalType": "uint256" }]
    },
    {
      "type": "function",
      "name": "submitTransaction",
      "stateMutability": "nonpayable",
      "inputs": [
        { "name": "_to", "type": "address", "internalType": "address" },
        { "name": "_value", "type": "uint256", "internalType": "uint256" },
        { "name": "_data", "type": "bytes", "internalType": "bytes" }
      ],
      "outputs": []
    },
    {
      "type": "function",
      "name": "confirmTransaction",
      "stateMutability": "nonpayable",
      "inputs": [{ "name": "_txIndex", "type": "uint256", "internalType": "uint256" }],
      "outputs": []
    },
    {
      "type": "receive",
      "stateMutability": "payable"
    }
  ],
  "bytecode": "0x608060405234801561001057600080fd5b50",
  "deployedBytecode": "0x6080604052",
  "linkReferences": {},
  "deployedLinkReferences": {}
}"#;

/// Records every request, answers calls from a selector table and confirms
/// submitted transactions immediately unless told otherwise.
pub struct MockLedger {
    requests: AtomicUsize,
    transaction_count: AtomicU64,
    hang_calls: AtomicBool,
    hang_submissions: AtomicBool,
    withhold_receipts: AtomicBool,
    reject_submissions: AtomicBool,
    revert_transactions: AtomicBool,
    skip_contract_address: AtomicBool,
    call_results: Mutex<HashMap<FixedBytes<4>, Bytes>>,
    calls: Mutex<Vec<CallRequest>>,
    submitted: Mutex<Vec<SignedTransaction>>,
    receipts: Mutex<HashMap<TxHash, TransactionReceipt>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            requests: AtomicUsize::new(0),
            transaction_count: AtomicU64::new(0),
            hang_calls: AtomicBool::new(false),
            hang_submissions: AtomicBool::new(false),
            withhold_receipts: AtomicBool::new(false),
            reject_submissions: AtomicBool::new(false),
            revert_transactions: AtomicBool::new(false),
            skip_contract_address: AtomicBool::new(false),
            call_results: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            receipts: Mutex::new(HashMap::new()),
        }
    }

    pub fn respond_to(&self, selector: FixedBytes<4>, output: Vec<u8>) {
        self.call_results
            .lock()
            .unwrap()
            .insert(selector, output.into());
    }

    pub fn set_transaction_count(&self, count: u64) {
        self.transaction_count.store(count, Ordering::SeqCst);
    }

    pub fn hang_calls(&self) {
        self.hang_calls.store(true, Ordering::SeqCst);
    }

    pub fn hang_submissions(&self) {
        self.hang_submissions.store(true, Ordering::SeqCst);
    }

    pub fn withhold_receipts(&self) {
        self.withhold_receipts.store(true, Ordering::SeqCst);
    }

    pub fn reject_submissions(&self) {
        self.reject_submissions.store(true, Ordering::SeqCst);
    }

    pub fn revert_transactions(&self) {
        self.revert_transactions.store(true, Ordering::SeqCst);
    }

    pub fn skip_contract_address(&self) {
        self.skip_contract_address.store(true, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<CallRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn chain_id(&self) -> ContractResult<u64> {
        self.record();
        Ok(31337)
    }

    async fn call(&self, request: &CallRequest) -> ContractResult<Bytes> {
        self.record();
        if self.hang_calls.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.calls.lock().unwrap().push(request.clone());

        let selector = request
            .input
            .get(..4)
            .map(FixedBytes::<4>::from_slice)
            .unwrap_or_default();
        self.call_results
            .lock()
            .unwrap()
            .get(&selector)
            .cloned()
            .ok_or_else(|| ContractError::RemoteExecution("execution reverted".to_string()))
    }

    async fn estimate_gas(&self, _request: &CallRequest) -> ContractResult<u64> {
        self.record();
        Ok(90_000)
    }

    async fn gas_price(&self) -> ContractResult<u128> {
        self.record();
        Ok(1_000_000_000)
    }

    async fn transaction_count(&self, _address: Address) -> ContractResult<u64> {
        self.record();
        Ok(self.transaction_count.load(Ordering::SeqCst))
    }

    async fn balance(&self, address: Address) -> ContractResult<U256> {
        self.record();
        Ok(U256::from_be_slice(&address[12..]))
    }

    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> ContractResult<TxHash> {
        self.record();
        if self.hang_submissions.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.reject_submissions.load(Ordering::SeqCst) {
            return Err(ContractError::RemoteExecution(
                "insufficient funds for gas * price + value".to_string(),
            ));
        }
        self.submitted.lock().unwrap().push(tx.clone());

        let contract_address = match tx.to {
            TxKind::Create if !self.skip_contract_address.load(Ordering::SeqCst) => {
                Some(DEPLOYED_ADDRESS)
            }
            _ => None,
        };
        let receipt = TransactionReceipt {
            transaction_hash: tx.hash,
            block_number: Some(1),
            contract_address,
            gas_used: 21_000,
            status: !self.revert_transactions.load(Ordering::SeqCst),
        };
        self.receipts.lock().unwrap().insert(tx.hash, receipt);
        Ok(tx.hash)
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> ContractResult<Option<TransactionReceipt>> {
        self.record();
        if self.withhold_receipts.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.receipts.lock().unwrap().get(&tx_hash).cloned())
    }
}
