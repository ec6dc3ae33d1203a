mod args;

use anyhow::{Context, Result};
use args::{Args, Command};
use clap::Parser;
use contract_eth::{
    balance::Balance,
    deploy::DeploymentClient,
    format_value,
    interact_contract::{ContractBinding, ContractInteract},
    interface::is_read_only,
    ClientConfig, ContractArtifact,
};
use log::info;
use std::sync::Arc;

const LOG_PREFIX: &str = "[🔐]";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config =
        ClientConfig::from_env().context("Loading configuration from the environment failed")?;
    args.apply(&mut config);
    info!("{LOG_PREFIX} Using {config:?}");

    let artifact = ContractArtifact::load(&args.artifact).with_context(|| {
        format!(
            "Loading contract artifact {} failed",
            args.artifact.display()
        )
    })?;

    match &args.command {
        Command::Deploy { .. } => deploy(&config, &artifact).await,
        Command::Interact {
            print_abi, call, ..
        } => interact(&config, &artifact, *print_abi, call).await,
    }
}

async fn deploy(config: &ClientConfig, artifact: &ContractArtifact) -> Result<()> {
    let connection = config.connect().await.context("Connecting to the network failed")?;
    let signer = Arc::new(
        config
            .signing_identity()
            .context("Loading the deployer key failed")?,
    );
    let balance = connection
        .get_balance_in_ether(signer.address())
        .await
        .context("Reading the deployer balance failed")?;
    info!(
        "{LOG_PREFIX} Deploying {} from {} (balance {balance} ETH)",
        artifact.name(),
        signer.address()
    );

    let constructor_args = config
        .constructor_args(&artifact.interface)
        .context("Invalid constructor arguments")?;
    let result = DeploymentClient::new(connection, signer)
        .with_confirmation_policy(config.confirmation)
        .deploy(artifact, &constructor_args)
        .await
        .with_context(|| format!("Deploying {} failed", artifact.name()))?;

    println!("Contract deployed to address: {}", result.address);
    println!("Deployment transaction: {}", result.transaction_hash);
    Ok(())
}

async fn interact(
    config: &ClientConfig,
    artifact: &ContractArtifact,
    print_abi: bool,
    call: &[String],
) -> Result<()> {
    if print_abi {
        println!(
            "ABI: {}",
            serde_json::to_string_pretty(artifact.interface.abi())?
        );
    }

    let (method, raw_args) = call.split_first().context("No method given")?;
    let raw_args: Vec<&str> = raw_args.iter().map(String::as_str).collect();
    let args = artifact
        .interface
        .coerce_args(method, &raw_args)
        .with_context(|| format!("Invalid arguments for {method}"))?;

    let address = config.contract_address()?;
    let connection = config.connect().await.context("Connecting to the network failed")?;
    let signer = match config.signing_secret {
        Some(_) => Some(Arc::new(config.signing_identity()?)),
        None => None,
    };
    let contract = ContractBinding::new(address, artifact.interface.clone(), connection, signer)
        .with_confirmation_policy(config.confirmation);

    let function = artifact.interface.function(method, args.len())?;
    if is_read_only(function) {
        let value = contract
            .call(method, &args)
            .await
            .with_context(|| format!("Calling {method} on {address} failed"))?;
        println!("{method} returned: {}", format_value(&value));
    } else {
        info!("{LOG_PREFIX} {method} changes state, sending a transaction");
        let receipt = contract
            .send(method, &args)
            .await
            .with_context(|| format!("Sending {method} to {address} failed"))?;
        println!(
            "{method} confirmed in transaction {} (gas used {})",
            receipt.transaction_hash, receipt.gas_used
        );
    }
    Ok(())
}
