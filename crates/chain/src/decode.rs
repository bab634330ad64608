//! Typed views over the loosely shaped JSON the archive hands out.
//!
//! Nothing untyped leaves this module except call/event arguments and error payloads,
//! which are stored as is.

use crate::serde::Amount;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fmt::{Display, Formatter};


#[derive(Debug)]
pub struct DecodeError {
    pub what: &'static str,
    pub message: String
}


impl DecodeError {
    pub fn new(what: &'static str, message: impl ToString) -> Self {
        Self {
            what,
            message: message.to_string()
        }
    }
}


impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to decode {}: {}", self.what, self.message)
    }
}


impl std::error::Error for DecodeError {}


pub fn decode_json<T: DeserializeOwned>(what: &'static str, value: &JsonValue) -> Result<T, DecodeError> {
    T::deserialize(value).map_err(|err| DecodeError::new(what, err))
}


/// Checks for a `0x` prefixed hex string of the given byte length.
pub fn is_hex_of_len(s: &str, bytes: usize) -> bool {
    let Some(hex) = s.strip_prefix("0x") else {
        return false
    };
    hex.len() == bytes * 2 && faster_hex::hex_check(hex.as_bytes())
}


pub const ACCOUNT_ID_LEN: usize = 32;
pub const ADDRESS20_LEN: usize = 20;


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOrigin {
    Signed(String),
    None,
    Root
}


#[derive(Deserialize)]
#[serde(tag = "__kind", content = "value")]
enum RawOrigin {
    #[serde(rename = "system")]
    System(RawSystemOrigin)
}


#[derive(Deserialize)]
#[serde(tag = "__kind", content = "value")]
enum RawSystemOrigin {
    Signed(String),
    None,
    Root
}


impl CallOrigin {
    pub fn decode(value: &JsonValue) -> Result<Self, DecodeError> {
        let RawOrigin::System(origin) = decode_json("call origin", value)?;
        Ok(match origin {
            RawSystemOrigin::Signed(address) => CallOrigin::Signed(address),
            RawSystemOrigin::None => CallOrigin::None,
            RawSystemOrigin::Root => CallOrigin::Root
        })
    }
}


/// Decodes an account address.
///
/// Accepts a plain account id or a `MultiAddress` variant carrying one.
/// The result is lowercased, so one account always maps to one id.
pub fn decode_address(value: &JsonValue) -> Result<String, DecodeError> {
    let (address, len) = match value {
        JsonValue::String(s) => (s.as_str(), ACCOUNT_ID_LEN),
        JsonValue::Object(map) => {
            let kind = map.get("__kind").and_then(|k| k.as_str()).unwrap_or_default();
            match (kind, map.get("value")) {
                ("Id" | "Address32", Some(JsonValue::String(s))) => (s.as_str(), ACCOUNT_ID_LEN),
                ("Address20", Some(JsonValue::String(s))) => (s.as_str(), ADDRESS20_LEN),
                _ => return Err(DecodeError::new("address", format!("unsupported address {}", value)))
            }
        },
        _ => return Err(DecodeError::new("address", format!("unsupported address {}", value)))
    };
    if is_hex_of_len(address, len) {
        Ok(address.to_ascii_lowercase())
    } else {
        Err(DecodeError::new("address", format!("`{}` is not a {} byte hex account id", address, len)))
    }
}


#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub public_key: Option<String>,
}


#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreDigest {
    pub slot: Option<u64>,
    pub solution: Option<Solution>,
}


#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreRuntime {
    pub engine: Option<String>,
    pub pre_digest: Option<PreDigest>,
}


#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineMessage {
    pub engine: Option<String>,
    pub data: Option<String>,
}


#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "__kind")]
pub enum DigestItem {
    PreRuntime(PreRuntime),
    Consensus(EngineMessage),
    Seal(EngineMessage),
    Other {
        #[serde(default)]
        value: Option<JsonValue>
    },
    RuntimeEnvironmentUpdated,
    #[serde(other)]
    Unknown
}


impl DigestItem {
    pub fn decode(value: &JsonValue) -> Result<Self, DecodeError> {
        decode_json("digest log", value)
    }

    /// Block author key carried by a pre-runtime digest, if it is well formed.
    pub fn author(&self) -> Option<String> {
        let DigestItem::PreRuntime(pre_runtime) = self else {
            return None
        };
        let key = pre_runtime.pre_digest.as_ref()?
            .solution.as_ref()?
            .public_key.as_deref()?;
        is_hex_of_len(key, ACCOUNT_ID_LEN).then(|| key.to_ascii_lowercase())
    }
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDigest {
    logs: Vec<JsonValue>
}


/// `System.Digest` storage value.
pub fn decode_digest_logs(value: &JsonValue) -> Result<Vec<JsonValue>, DecodeError> {
    decode_json::<RawDigest>("digest", value).map(|d| d.logs)
}


#[derive(Deserialize)]
struct RawSolutionRanges {
    current: Amount
}


/// `Subspace.SolutionRanges` storage value, returns the current range.
pub fn decode_solution_range(value: &JsonValue) -> Result<u64, DecodeError> {
    let ranges: RawSolutionRanges = decode_json("solution ranges", value)?;
    u64::try_from(ranges.current.0).map_err(|_| {
        DecodeError::new("solution ranges", format!("{} is out of u64 range", ranges.current.0))
    })
}


pub fn decode_amount(what: &'static str, value: &JsonValue) -> Result<u128, DecodeError> {
    decode_json::<Amount>(what, value).map(|a| a.0)
}


#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorDetails {
    pub signing_key: Option<String>,
    pub current_domain_id: Option<u32>,
    pub minimum_nominator_stake: Option<Amount>,
    pub nomination_tax: Option<u8>,
    pub current_total_stake: Option<Amount>,
    pub total_shares: Option<Amount>,
}


/// `Domains.Operators` storage value.
pub fn decode_operator_details(value: &JsonValue) -> Result<OperatorDetails, DecodeError> {
    decode_json("operator details", value)
}
