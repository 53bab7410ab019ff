use serde::{Deserialize, Serialize};
use std::fmt;

/// Values toncenter sends either as a JSON string or as a number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrInt {
    String(String),
    Int(i64),
}

impl StringOrInt {
    /// Parses the value as an unsigned amount (balances, nanotons)
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            StringOrInt::String(s) => s.parse().ok(),
            StringOrInt::Int(i) => u128::try_from(*i).ok(),
        }
    }
}

impl fmt::Display for StringOrInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringOrInt::String(s) => f.write_str(s),
            StringOrInt::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for StringOrInt {
    fn from(value: &str) -> Self {
        StringOrInt::String(value.to_string())
    }
}

impl From<i64> for StringOrInt {
    fn from(value: i64) -> Self {
        StringOrInt::Int(value)
    }
}
