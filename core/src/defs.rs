use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, utoipa::ToSchema)]
#[schema(title = "EVM Address")]
/// Used to represent an EVM address. This is a string of length 42 with a `0x` prefix. Non-checksummed addresses are also supported, but will be converted to checksummed.
pub struct AddressDef(pub String);

#[derive(Serialize, Deserialize, Clone, utoipa::ToSchema)]
#[schema(title = "Transaction Hash")]
/// A 32-byte transaction hash as a 0x prefixed hex string.
pub struct TxHashDef(pub String);

#[derive(Serialize, Deserialize, Clone, utoipa::ToSchema)]
#[schema(title = "Quantity")]
/// A hex-encoded unsigned quantity in the Ethereum "quantity" format, e.g. `0x1b4`.
pub struct QuantityDef(pub String);

#[derive(Serialize, Deserialize, Clone, utoipa::ToSchema)]
#[schema(title = "U256")]
/// Used to represent a 256-bit unsigned integer. Parsed from any valid encoding of the Ethereum "quantity" format.
pub struct U256Def(pub String);
