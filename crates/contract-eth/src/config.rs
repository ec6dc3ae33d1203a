use crate::client::{ConfirmationPolicy, NetworkConnection};
use crate::error::{ContractError, ContractResult};
use crate::interface::InterfaceDescription;
use crate::signer::SigningIdentity;
use alloy::{dyn_abi::DynSolValue, primitives::Address};
use std::{fmt, time::Duration};

pub const DEFAULT_NETWORK: &str = "goerli";

#[derive(Clone)]
pub struct ClientConfig {
    pub network: String,
    pub endpoint_credential: Option<String>,
    /// Overrides the endpoint derived from `network`.
    pub rpc_url: Option<String>,
    pub signing_secret: Option<String>,
    pub contract_address: Option<String>,
    pub owners: Vec<String>,
    pub required: u64,
    /// Explicit constructor arguments; take precedence over `owners`/`required`.
    pub constructor_args: Vec<String>,
    pub confirmation: ConfirmationPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            endpoint_credential: None,
            rpc_url: None,
            signing_secret: None,
            contract_address: None,
            owners: Vec::new(),
            required: 1,
            constructor_args: Vec::new(),
            confirmation: ConfirmationPolicy::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redacted(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "<redacted>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("ClientConfig")
            .field("network", &self.network)
            .field("endpoint_credential", &redacted(&self.endpoint_credential))
            .field("rpc_url", &redacted(&self.rpc_url))
            .field("signing_secret", &redacted(&self.signing_secret))
            .field("contract_address", &self.contract_address)
            .field("owners", &self.owners)
            .field("required", &self.required)
            .field("constructor_args", &self.constructor_args)
            .field("confirmation", &self.confirmation)
            .finish()
    }
}

impl ClientConfig {
    /// Read `NETWORK`, `API_KEY`, `RPC_URL`, `PRIVATE_KEY`, `CONTRACT_ADDRESS`,
    /// `OWNER_ADDRESS` (comma separated), `REQUIRED_CONFIRMATIONS` and
    /// `CONFIRMATION_TIMEOUT_SECS`.
    pub fn from_env() -> ContractResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ContractResult<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let required = match var("REQUIRED_CONFIRMATIONS") {
            Some(v) => v
                .parse()
                .map_err(|_| ContractError::Config(format!("REQUIRED_CONFIRMATIONS `{v}` is not a number")))?,
            None => defaults.required,
        };
        let mut confirmation = defaults.confirmation;
        if let Some(v) = var("CONFIRMATION_TIMEOUT_SECS") {
            let secs = v.parse().map_err(|_| {
                ContractError::Config(format!("CONFIRMATION_TIMEOUT_SECS `{v}` is not a number"))
            })?;
            confirmation.timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            network: var("NETWORK").unwrap_or(defaults.network),
            endpoint_credential: var("API_KEY"),
            rpc_url: var("RPC_URL"),
            signing_secret: var("PRIVATE_KEY"),
            contract_address: var("CONTRACT_ADDRESS"),
            owners: var("OWNER_ADDRESS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            required,
            constructor_args: Vec::new(),
            confirmation,
        })
    }

    pub async fn connect(&self) -> ContractResult<NetworkConnection> {
        match &self.rpc_url {
            Some(rpc_url) => NetworkConnection::connect_url(rpc_url).await,
            None => {
                NetworkConnection::connect(&self.network, self.endpoint_credential.as_deref()).await
            }
        }
    }

    pub fn signing_identity(&self) -> ContractResult<SigningIdentity> {
        let secret = self
            .signing_secret
            .as_deref()
            .ok_or_else(|| ContractError::Config("PRIVATE_KEY is not set".to_string()))?;
        SigningIdentity::from_secret(secret)
    }

    pub fn contract_address(&self) -> ContractResult<Address> {
        let address = self
            .contract_address
            .as_deref()
            .ok_or_else(|| ContractError::Config("CONTRACT_ADDRESS is not set".to_string()))?;
        address
            .parse()
            .map_err(|_| ContractError::Config(format!("`{address}` is not a valid address")))
    }

    /// Constructor arguments as text: the explicit list if given, otherwise
    /// `[owners], required` when owners are configured.
    pub fn constructor_arg_strings(&self) -> Vec<String> {
        if !self.constructor_args.is_empty() {
            return self.constructor_args.clone();
        }
        if self.owners.is_empty() {
            return Vec::new();
        }
        vec![
            format!("[{}]", self.owners.join(",")),
            self.required.to_string(),
        ]
    }

    pub fn constructor_args(
        &self,
        interface: &InterfaceDescription,
    ) -> ContractResult<Vec<DynSolValue>> {
        let args = self.constructor_arg_strings();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        interface.coerce_constructor_args(&args)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
