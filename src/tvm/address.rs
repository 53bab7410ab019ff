//! TON Address implementation
//!
//! An address is a workchain id plus the 256-bit hash of the account's
//! initial state. It has two textual forms:
//!
//! - raw: `<workchain>:<64 hex chars>`, e.g. `0:83df...31a8`
//! - user-friendly: 48 base64 characters encoding
//!   `tag (1) | workchain (1) | hash (32) | crc16 (2)`
//!
//! The presentation flags parsed from a string (url-safe alphabet,
//! bounceable, test-only) are kept so the address prints back the way it was
//! given, but they are not part of its identity.

use crate::crc::CRC16;
use crate::tvm::error::{Result, TvmError};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

pub const MASTERCHAIN: i32 = -1;
pub const BASECHAIN: i32 = 0;

const BOUNCEABLE_TAG: u8 = 0x11;
const NON_BOUNCEABLE_TAG: u8 = 0x51;
const TEST_FLAG: u8 = 0x80;

/// Length of a decoded user-friendly address
const USER_FRIENDLY_BYTES: usize = 36;
/// Length of a user-friendly address string
const USER_FRIENDLY_LEN: usize = 48;

/// Builds the tag byte of a user-friendly address
pub fn pack_tag(bounceable: bool, test_only: bool) -> u8 {
    let tag = if bounceable {
        BOUNCEABLE_TAG
    } else {
        NON_BOUNCEABLE_TAG
    };
    if test_only { tag | TEST_FLAG } else { tag }
}

/// Splits a tag byte into `(bounceable, test_only)`
pub fn unpack_tag(tag: u8) -> Result<(bool, bool)> {
    let test_only = tag & TEST_FLAG != 0;
    match tag & !TEST_FLAG {
        BOUNCEABLE_TAG => Ok((true, test_only)),
        NON_BOUNCEABLE_TAG => Ok((false, test_only)),
        _ => Err(TvmError::bad_address(format!(
            "unknown address tag 0x{:02x}",
            tag
        ))),
    }
}

/// CRC-16/XMODEM of the first 34 bytes of a user-friendly address, big-endian
pub fn address_checksum(data: &[u8]) -> [u8; 2] {
    CRC16.checksum(data).to_be_bytes()
}

fn check_workchain(workchain: i32) -> Result<i8> {
    match workchain {
        MASTERCHAIN | BASECHAIN => Ok(workchain as i8),
        _ => Err(TvmError::InvalidWorkchain(workchain)),
    }
}

/// Presentation options for [`Address::to_string_with`].
///
/// `None` keeps the value stored in the address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressFormat {
    pub user_friendly: Option<bool>,
    pub url_safe: Option<bool>,
    pub bounceable: Option<bool>,
    pub test_only: Option<bool>,
}

impl AddressFormat {
    /// `<workchain>:<hex>`
    pub fn raw() -> Self {
        Self {
            user_friendly: Some(false),
            ..Self::default()
        }
    }

    /// Fully specified user-friendly form
    pub fn user_friendly(url_safe: bool, bounceable: bool, test_only: bool) -> Self {
        Self {
            user_friendly: Some(true),
            url_safe: Some(url_safe),
            bounceable: Some(bounceable),
            test_only: Some(test_only),
        }
    }
}

/// Represents a TON blockchain address
#[derive(Debug, Clone, Copy)]
pub struct Address {
    /// Workchain ID (-1 for masterchain, 0 for basechain)
    workchain: i8,
    /// 32-byte hash part of the address
    hash_part: [u8; 32],
    is_user_friendly: bool,
    is_url_safe: bool,
    is_bounceable: bool,
    is_test_only: bool,
}

impl Address {
    /// Creates a new address from workchain and hash part.
    ///
    /// The address prints as bounceable, url-safe and user-friendly unless
    /// re-flagged with the `with_*` methods.
    pub fn new(workchain: i32, hash_part: [u8; 32]) -> Result<Self> {
        Ok(Self {
            workchain: check_workchain(workchain)?,
            hash_part,
            is_user_friendly: true,
            is_url_safe: true,
            is_bounceable: true,
            is_test_only: false,
        })
    }

    /// Parses either the raw or the user-friendly form
    pub fn parse(address: &str) -> Result<Self> {
        if address.is_empty() {
            return Err(TvmError::bad_address("empty address"));
        }
        if address.contains(':') {
            Self::from_raw(address)
        } else {
            Self::from_user_friendly(address)
        }
    }

    /// Returns true if `address` parses in either form
    pub fn is_valid(address: &str) -> bool {
        Self::parse(address).is_ok()
    }

    /// Parses address from raw format: "workchain:hash"
    pub fn from_raw(address: &str) -> Result<Self> {
        let (workchain, hash_hex) = address
            .split_once(':')
            .ok_or_else(|| TvmError::bad_address("raw address must contain ':'"))?;
        if hash_hex.contains(':') {
            return Err(TvmError::bad_address("raw address has more than one ':'"));
        }

        let workchain: i32 = workchain.parse().map_err(|_| {
            TvmError::bad_address(format!("invalid workchain number '{}'", workchain))
        })?;
        let workchain = check_workchain(workchain)?;

        if hash_hex.len() != 64 {
            return Err(TvmError::bad_address(
                "hash part must be 64 hex characters",
            ));
        }
        let mut hash_part = [0u8; 32];
        hex::decode_to_slice(hash_hex, &mut hash_part)
            .map_err(|e| TvmError::bad_address(format!("invalid hash part: {}", e)))?;

        Ok(Self {
            workchain,
            hash_part,
            is_user_friendly: false,
            is_url_safe: false,
            is_bounceable: false,
            is_test_only: false,
        })
    }

    /// Parses address from base64 user-friendly format, either alphabet
    pub fn from_user_friendly(address: &str) -> Result<Self> {
        if address.len() != USER_FRIENDLY_LEN {
            return Err(TvmError::bad_address(format!(
                "user-friendly address must be {} characters, got {}",
                USER_FRIENDLY_LEN,
                address.len()
            )));
        }

        let is_url_safe = address.contains(['-', '_']);
        let normalized = address.replace('-', "+").replace('_', "/");
        let decoded = STANDARD
            .decode(normalized)
            .map_err(|e| TvmError::bad_address(format!("invalid base64: {}", e)))?;
        if decoded.len() != USER_FRIENDLY_BYTES {
            return Err(TvmError::bad_address(format!(
                "decoded address must be {} bytes, got {}",
                USER_FRIENDLY_BYTES,
                decoded.len()
            )));
        }

        let (body, crc) = decoded.split_at(34);
        let expected = address_checksum(body);
        if crc != expected {
            return Err(TvmError::ChecksumMismatch {
                expected: hex::encode(expected),
                actual: hex::encode(crc),
            });
        }

        let (is_bounceable, is_test_only) = unpack_tag(body[0])?;
        let workchain = check_workchain(body[1] as i8 as i32)?;
        let mut hash_part = [0u8; 32];
        hash_part.copy_from_slice(&body[2..34]);

        Ok(Self {
            workchain,
            hash_part,
            is_user_friendly: true,
            is_url_safe,
            is_bounceable,
            is_test_only,
        })
    }

    pub fn workchain(&self) -> i8 {
        self.workchain
    }

    pub fn hash_part(&self) -> &[u8; 32] {
        &self.hash_part
    }

    pub fn is_user_friendly(&self) -> bool {
        self.is_user_friendly
    }

    pub fn is_url_safe(&self) -> bool {
        self.is_url_safe
    }

    pub fn is_bounceable(&self) -> bool {
        self.is_bounceable
    }

    pub fn is_test_only(&self) -> bool {
        self.is_test_only
    }

    pub fn with_user_friendly(self, user_friendly: bool) -> Self {
        Self {
            is_user_friendly: user_friendly,
            ..self
        }
    }

    pub fn with_url_safe(self, url_safe: bool) -> Self {
        Self {
            is_url_safe: url_safe,
            ..self
        }
    }

    pub fn with_bounceable(self, bounceable: bool) -> Self {
        Self {
            is_bounceable: bounceable,
            ..self
        }
    }

    pub fn with_test_only(self, test_only: bool) -> Self {
        Self {
            is_test_only: test_only,
            ..self
        }
    }

    /// Converts to raw format (workchain:hash)
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash_part))
    }

    /// Converts to user-friendly base64 format
    pub fn to_user_friendly(&self, url_safe: bool, bounceable: bool, test_only: bool) -> String {
        let mut data = Vec::with_capacity(USER_FRIENDLY_BYTES);
        data.push(pack_tag(bounceable, test_only));
        data.push(self.workchain as u8);
        data.extend_from_slice(&self.hash_part);
        let crc = address_checksum(&data);
        data.extend_from_slice(&crc);

        if url_safe {
            URL_SAFE.encode(&data)
        } else {
            STANDARD.encode(&data)
        }
    }

    /// Formats the address, falling back to the stored flags for every
    /// option left as `None`
    pub fn to_string_with(&self, format: AddressFormat) -> String {
        if !format.user_friendly.unwrap_or(self.is_user_friendly) {
            return self.to_raw();
        }
        self.to_user_friendly(
            format.url_safe.unwrap_or(self.is_url_safe),
            format.bounceable.unwrap_or(self.is_bounceable),
            format.test_only.unwrap_or(self.is_test_only),
        )
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.workchain == other.workchain && self.hash_part == other.hash_part
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.workchain.hash(state);
        self.hash_part.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(AddressFormat::default()))
    }
}

impl FromStr for Address {
    type Err = TvmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
