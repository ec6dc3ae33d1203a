use crate::error::{ContractError, ContractResult};
use alloy::{
    dyn_abi::{DynSolType, DynSolValue, Specifier},
    json_abi::{Constructor, Function, JsonAbi, Param, StateMutability},
    primitives::Bytes,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDescription {
    abi: JsonAbi,
}

impl InterfaceDescription {
    pub fn new(abi: JsonAbi) -> Self {
        Self { abi }
    }

    pub fn from_json(json: &str) -> ContractResult<Self> {
        let abi = serde_json::from_str(json)
            .map_err(|e| ContractError::Artifact(format!("malformed ABI: {e}")))?;
        Ok(Self { abi })
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    pub fn function(&self, method: &str, arg_count: usize) -> ContractResult<&Function> {
        let overloads = self
            .abi
            .function(method)
            .ok_or_else(|| ContractError::MethodNotFound(method.to_string()))?;

        overloads
            .iter()
            .find(|f| f.inputs.len() == arg_count)
            .ok_or_else(|| ContractError::Arity {
                method: method.to_string(),
                expected: expected_counts(overloads.iter().map(|f| f.inputs.len())),
                got: arg_count,
            })
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.abi.constructor()
    }

    pub fn coerce_args(&self, method: &str, args: &[&str]) -> ContractResult<Vec<DynSolValue>> {
        coerce_params(&self.function(method, args.len())?.inputs, args)
    }

    pub fn coerce_constructor_args(&self, args: &[&str]) -> ContractResult<Vec<DynSolValue>> {
        let inputs = self.constructor().map(|c| c.inputs.as_slice()).unwrap_or(&[]);
        if inputs.len() != args.len() {
            return Err(ContractError::Arity {
                method: "constructor".to_string(),
                expected: inputs.len().to_string(),
                got: args.len(),
            });
        }
        coerce_params(inputs, args)
    }
}

pub fn is_read_only(function: &Function) -> bool {
    matches!(
        function.state_mutability,
        StateMutability::View | StateMutability::Pure
    )
}

fn expected_counts(counts: impl Iterator<Item = usize>) -> String {
    let mut counts: Vec<usize> = counts.collect();
    counts.sort_unstable();
    counts.dedup();
    counts
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

fn coerce_params(params: &[Param], args: &[&str]) -> ContractResult<Vec<DynSolValue>> {
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| -> ContractResult<DynSolValue> {
            let ty: DynSolType = param.resolve()?;
            Ok(ty.coerce_str(arg)?)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    abi: JsonAbi,
    #[serde(default)]
    bytecode: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: Option<String>,
    pub interface: InterfaceDescription,
    pub bytecode: Option<Bytes>,
}

impl ContractArtifact {
    pub fn load(path: impl AsRef<Path>) -> ContractResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Accepts a hardhat/foundry style artifact object or a bare ABI array.
    pub fn from_json(json: &str) -> ContractResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ContractError::Artifact(format!("not valid JSON: {e}")))?;

        if value.is_array() {
            let abi = serde_json::from_value(value)
                .map_err(|e| ContractError::Artifact(format!("malformed ABI: {e}")))?;
            return Ok(Self {
                contract_name: None,
                interface: InterfaceDescription::new(abi),
                bytecode: None,
            });
        }

        let artifact: HardhatArtifact = serde_json::from_value(value)
            .map_err(|e| ContractError::Artifact(format!("malformed artifact: {e}")))?;
        let bytecode = match artifact.bytecode.as_deref().map(str::trim) {
            None | Some("") | Some("0x") => None,
            Some(hex) => Some(hex.parse::<Bytes>().map_err(|e| {
                ContractError::Artifact(format!("bytecode is not valid hex: {e}"))
            })?),
        };

        Ok(Self {
            contract_name: artifact.contract_name,
            interface: InterfaceDescription::new(artifact.abi),
            bytecode,
        })
    }

    pub fn name(&self) -> &str {
        self.contract_name.as_deref().unwrap_or("contract")
    }
}

pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(address) => address.to_checksum(None),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Uint(n, _) => n.to_string(),
        DynSolValue::Int(n, _) => n.to_string(),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Bytes(bytes) => alloy::hex::encode_prefixed(bytes),
        DynSolValue::FixedBytes(word, size) => alloy::hex::encode_prefixed(&word[..*size]),
        DynSolValue::Function(function) => function.to_string(),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            format!("[{}]", join_values(items))
        }
        DynSolValue::Tuple(items) => format!("({})", join_values(items)),
        #[allow(unreachable_patterns)]
        other => format!("{other:?}"),
    }
}

fn join_values(values: &[DynSolValue]) -> String {
    values.iter().map(format_value).collect::<Vec<_>>().join(", ")
}
