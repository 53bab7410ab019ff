//! Decoding of `runGetMethod` result stacks
//!
//! toncenter returns every stack entry as a `[type, value]` pair. Numbers come
//! as hex strings, cells as base64 BoCs, and lists or tuples as nested
//! `tvm.*` objects.

use std::str::FromStr;
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::Num;
use serde_json::Value;

use crate::client::error::{ProviderError, Result};
use crate::models::toncenter_v2::RunGetMethodResult;
use crate::tvm::{Cell, base64_to_boc};

#[derive(Debug, Clone, PartialEq)]
pub enum StackValue {
    Num(BigInt),
    Cell(Arc<Cell>),
    Tuple(Vec<StackValue>),
}

impl StackValue {
    pub fn as_num(&self) -> Option<&BigInt> {
        match self {
            StackValue::Num(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> Option<&Arc<Cell>> {
        match self {
            StackValue::Cell(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[StackValue]> {
        match self {
            StackValue::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

fn unexpected(value: &Value) -> ProviderError {
    ProviderError::UnexpectedStackEntry(value.to_string())
}

/// Parses a hex number such as `"0x1f"` or `"-0x1"`
pub fn parse_num(s: &str) -> Result<BigInt> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    let value = BigInt::from_str_radix(digits, 16)
        .map_err(|_| ProviderError::UnexpectedStackEntry(s.to_string()))?;
    Ok(if negative { -value } else { value })
}

fn parse_cell_bytes(obj: &Value) -> Result<Arc<Cell>> {
    let bytes = obj
        .get("bytes")
        .and_then(Value::as_str)
        .ok_or_else(|| unexpected(obj))?;
    Ok(base64_to_boc(bytes)?)
}

/// Decodes a nested `tvm.*` object found inside list and tuple entries
pub fn parse_object(obj: &Value) -> Result<StackValue> {
    let type_name = obj
        .get("@type")
        .and_then(Value::as_str)
        .ok_or_else(|| unexpected(obj))?;
    match type_name {
        "tvm.list" | "tvm.tuple" => {
            let elements = obj
                .get("elements")
                .and_then(Value::as_array)
                .ok_or_else(|| unexpected(obj))?;
            let items = elements
                .iter()
                .map(parse_object)
                .collect::<Result<Vec<_>>>()?;
            Ok(StackValue::Tuple(items))
        }
        "tvm.stackEntryTuple" => parse_object(obj.get("tuple").ok_or_else(|| unexpected(obj))?),
        "tvm.stackEntryNumber" => {
            parse_object(obj.get("number").ok_or_else(|| unexpected(obj))?)
        }
        "tvm.stackEntryCell" => parse_object(obj.get("cell").ok_or_else(|| unexpected(obj))?),
        "tvm.stackEntrySlice" => {
            parse_object(obj.get("slice").ok_or_else(|| unexpected(obj))?)
        }
        "tvm.numberDecimal" => {
            let number = obj
                .get("number")
                .and_then(Value::as_str)
                .ok_or_else(|| unexpected(obj))?;
            let value = BigInt::from_str(number)
                .map_err(|_| ProviderError::UnexpectedStackEntry(number.to_string()))?;
            Ok(StackValue::Num(value))
        }
        "tvm.cell" | "tvm.slice" => Ok(StackValue::Cell(parse_cell_bytes(obj)?)),
        _ => Err(unexpected(obj)),
    }
}

/// Decodes one `[type, value]` entry of a result stack
pub fn parse_stack_entry(entry: &Value) -> Result<StackValue> {
    let pair = entry.as_array().ok_or_else(|| unexpected(entry))?;
    let (kind, value) = match pair.as_slice() {
        [kind, value] => (kind.as_str().ok_or_else(|| unexpected(entry))?, value),
        _ => return Err(unexpected(entry)),
    };
    match kind {
        "num" => {
            let s = value.as_str().ok_or_else(|| unexpected(entry))?;
            Ok(StackValue::Num(parse_num(s)?))
        }
        "cell" | "slice" => Ok(StackValue::Cell(parse_cell_bytes(value)?)),
        "list" | "tuple" => parse_object(value),
        _ => Err(unexpected(entry)),
    }
}

/// Decodes a whole get-method result, failing on a non-zero exit code
pub fn parse_response(result: &RunGetMethodResult) -> Result<Vec<StackValue>> {
    if result.exit_code != 0 {
        return Err(ProviderError::ExitCode(result.exit_code));
    }
    result.stack.iter().map(parse_stack_entry).collect()
}
