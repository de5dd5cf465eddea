//! Contract ABI bindings
//!
//! ABIs live in the crate's /abis folder as `{name, description, abi}` JSON
//! files and are embedded at compile time.

pub mod voting;

use ethers::abi::Abi;
use serde::Deserialize;
use serde_json::Value;

/// ABI file structure
#[derive(Debug, Deserialize)]
pub(crate) struct AbiFile {
    pub name: String,
    pub abi: Vec<Value>,
}

/// Parse an ethers Abi from our ABI file format
pub(crate) fn parse_abi_file(content: &str) -> Result<Abi, String> {
    let abi_file: AbiFile = serde_json::from_str(content)
        .map_err(|e| format!("Failed to parse ABI file: {}", e))?;

    serde_json::from_value(Value::Array(abi_file.abi))
        .map_err(|e| format!("Failed to parse ABI '{}': {}", abi_file.name, e))
}
