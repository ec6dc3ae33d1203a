use clap::{Parser, Subcommand};
use contract_eth::ClientConfig;
use std::{path::PathBuf, time::Duration};

/// Deploy a MultiSigWallet or read from a deployed one. Every setting can be
/// given as a flag or through its environment variable (`.env` is loaded first).
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    #[arg(
        long = "network",
        env = "NETWORK",
        help = "Named network to use: mainnet, goerli, sepolia, holesky or localhost."
    )]
    pub network: Option<String>,

    #[arg(
        long = "rpc-url",
        env = "RPC_URL",
        help = "Explicit RPC endpoint (http or ws). Takes precedence over the named network."
    )]
    pub rpc_url: Option<String>,

    #[arg(
        long = "api-key",
        env = "API_KEY",
        hide_env_values = true,
        help = "Endpoint API key for hosted networks."
    )]
    pub api_key: Option<String>,

    #[arg(
        long = "private-key",
        env = "PRIVATE_KEY",
        hide_env_values = true,
        help = "Hex encoded key used to sign transactions."
    )]
    pub private_key: Option<String>,

    #[arg(
        default_value = "artifacts/contracts/multisig_wallet.sol/MultiSigWallet.json",
        long = "artifact",
        env = "ARTIFACT_PATH",
        help = "Compiled contract artifact holding the ABI and creation bytecode."
    )]
    pub artifact: PathBuf,

    #[arg(
        long = "confirm-timeout",
        env = "CONFIRMATION_TIMEOUT_SECS",
        help = "Seconds to wait for a transaction to be confirmed."
    )]
    pub confirm_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy a new contract instance and print its address.
    Deploy {
        #[arg(
            long = "owner",
            env = "OWNER_ADDRESS",
            value_delimiter = ',',
            help = "Initial owner address, repeatable or comma separated."
        )]
        owners: Vec<String>,

        #[arg(
            long = "required",
            env = "REQUIRED_CONFIRMATIONS",
            help = "Confirmations required to execute a transaction."
        )]
        required: Option<u64>,

        #[arg(
            long = "arg",
            help = "Raw constructor argument, repeatable. Replaces the owners/required arguments."
        )]
        constructor_args: Vec<String>,
    },
    /// Call a method on a deployed contract and print the result.
    Interact {
        #[arg(
            long = "contract-address",
            env = "CONTRACT_ADDRESS",
            help = "Address of the deployed contract."
        )]
        contract_address: Option<String>,

        #[arg(
            long = "print-abi",
            default_value = "false",
            help = "Print the contract ABI before calling."
        )]
        print_abi: bool,

        #[arg(
            default_values_t = ["owners".to_string(), "0".to_string()],
            help = "Method name followed by its arguments."
        )]
        call: Vec<String>,
    },
}

impl Args {
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(network) = &self.network {
            config.network = network.clone();
        }
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = Some(rpc_url.clone());
        }
        if let Some(api_key) = &self.api_key {
            config.endpoint_credential = Some(api_key.clone());
        }
        if let Some(private_key) = &self.private_key {
            config.signing_secret = Some(private_key.clone());
        }
        if let Some(secs) = self.confirm_timeout {
            config.confirmation.timeout = Duration::from_secs(secs);
        }

        match &self.command {
            Command::Deploy {
                owners,
                required,
                constructor_args,
            } => {
                if !owners.is_empty() {
                    config.owners = owners.clone();
                }
                if let Some(required) = required {
                    config.required = *required;
                }
                if !constructor_args.is_empty() {
                    config.constructor_args = constructor_args.clone();
                }
            }
            Command::Interact {
                contract_address, ..
            } => {
                if let Some(address) = contract_address {
                    config.contract_address = Some(address.clone());
                }
            }
        }
    }
}
