use std::sync::Arc;

use num_bigint::BigInt;
use serde::ser::{Error as _, SerializeTuple};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::models::basic::StringOrInt;
use crate::tvm::{Cell, boc_to_base64};

/// `shard` value selecting every shard of the masterchain
pub const SHARD_ID_ALL: &str = "-9223372036854775808";

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub id: u32,
    pub jsonrpc: &'a str,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(method: &'a str, params: Value) -> Self {
        Self {
            id: 1,
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockIdExt {
    pub workchain: i32,
    pub shard: StringOrInt,
    pub seqno: u32,
    pub root_hash: String,
    pub file_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterchainInfo {
    pub last: BlockIdExt,
    pub state_root_hash: String,
    pub init: BlockIdExt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalTransactionId {
    pub lt: StringOrInt,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressInformation {
    pub balance: Option<StringOrInt>,
    pub code: Option<String>,
    pub data: Option<String>,
    pub last_transaction_id: Option<InternalTransactionId>,
    pub frozen_hash: Option<String>,
    pub sync_utime: Option<i64>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInformation {
    pub wallet: Option<bool>,
    pub balance: Option<StringOrInt>,
    pub account_state: Option<String>,
    pub wallet_type: Option<String>,
    pub seqno: Option<i64>,
    pub wallet_id: Option<i64>,
    pub last_transaction_id: Option<InternalTransactionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateFeeParams {
    pub address: String,
    /// Base64 BoC of the message body
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_data: Option<String>,
    pub ignore_chksig: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendQueryParams {
    pub address: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_data: Option<String>,
}

/// Argument of a get-method call, serialized as a `[type, value]` pair
#[derive(Debug, Clone)]
pub enum StackArg {
    Num(BigInt),
    Cell(Arc<Cell>),
    Slice(Arc<Cell>),
}

impl Serialize for StackArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        match self {
            StackArg::Num(value) => {
                pair.serialize_element("num")?;
                pair.serialize_element(&format!("{:#x}", value))?;
            }
            StackArg::Cell(cell) => {
                pair.serialize_element("tvm.Cell")?;
                pair.serialize_element(&boc_to_base64(cell, false).map_err(S::Error::custom)?)?;
            }
            StackArg::Slice(cell) => {
                pair.serialize_element("tvm.Slice")?;
                pair.serialize_element(&boc_to_base64(cell, false).map_err(S::Error::custom)?)?;
            }
        }
        pair.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunGetMethodParams {
    pub address: String,
    /// Method name or numeric id
    pub method: StringOrInt,
    pub stack: Vec<StackArg>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunGetMethodResult {
    pub gas_used: Option<i64>,
    /// Raw `[type, value]` entries, see [`crate::models::stack`]
    #[serde(default)]
    pub stack: Vec<Value>,
    pub exit_code: i64,
}
