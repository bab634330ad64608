use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sxp_primitives::serde::{decimal, decimal_option};
use sxp_primitives::{BlockNumber, ItemIndex, Phase};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub height: BlockNumber,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: Option<i64>,
    pub spec_version: u32,
    pub author_id: Option<String>,
    #[serde(with = "decimal")]
    pub space_pledged: u128,
    #[serde(with = "decimal")]
    pub blockchain_size: u128,
    pub extrinsics_count: u32,
    pub events_count: u32,
    pub extrinsic_ids: Vec<String>,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extrinsic {
    pub id: String,
    pub block_id: String,
    pub block_height: BlockNumber,
    pub index_in_block: ItemIndex,
    pub version: u32,
    pub success: bool,
    pub hash: String,
    pub signer_id: Option<String>,
    /// Dispatch error of a failed extrinsic
    pub error: Option<JsonValue>,
    #[serde(with = "decimal_option")]
    pub fee: Option<u128>,
    #[serde(with = "decimal_option")]
    pub tip: Option<u128>,
    pub call_id: Option<String>,
}


#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginKind {
    Signed,
    None,
    Root
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOrigin {
    pub kind: OriginKind,
    pub address: Option<String>,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: String,
    pub block_id: String,
    pub block_height: BlockNumber,
    pub extrinsic_id: String,
    /// `None` only for the root call of an extrinsic
    pub parent_id: Option<String>,
    pub name: String,
    pub pos: ItemIndex,
    pub success: bool,
    pub error: Option<JsonValue>,
    pub args: JsonValue,
    pub origin: Option<CallOrigin>,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub block_id: String,
    pub block_height: BlockNumber,
    pub index_in_block: ItemIndex,
    pub name: String,
    pub pos: ItemIndex,
    pub phase: Phase,
    pub args: JsonValue,
    pub extrinsic_id: Option<String>,
    pub call_id: Option<String>,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub updated_at: BlockNumber,
}


impl Account {
    pub fn new(id: &str, updated_at: BlockNumber) -> Self {
        Self {
            id: id.to_string(),
            updated_at
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRewards {
    pub id: String,
    pub account_id: String,
    #[serde(with = "decimal")]
    pub block: u128,
    #[serde(with = "decimal")]
    pub vote: u128,
    #[serde(with = "decimal")]
    pub amount: u128,
    pub updated_at: BlockNumber,
}


impl AccountRewards {
    pub fn new(account_id: &str, updated_at: BlockNumber) -> Self {
        Self {
            id: account_id.to_string(),
            account_id: account_id.to_string(),
            block: 0,
            vote: 0,
            amount: 0,
            updated_at
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorRewards {
    pub id: String,
    #[serde(with = "decimal")]
    pub amount: u128,
    pub updated_at: BlockNumber,
}


impl OperatorRewards {
    pub fn new(operator_id: &str, updated_at: BlockNumber) -> Self {
        Self {
            id: operator_id.to_string(),
            amount: 0,
            updated_at
        }
    }
}


#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorStatus {
    Registered,
    Deregistered,
    Slashed
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: String,
    pub signing_key: String,
    pub domain_id: u32,
    #[serde(with = "decimal")]
    pub minimum_nominator_stake: u128,
    /// Percentage of rewards kept by the operator
    pub nomination_tax: u8,
    #[serde(with = "decimal")]
    pub total_stake: u128,
    #[serde(with = "decimal")]
    pub total_shares: u128,
    pub status: OperatorStatus,
    pub nominator_ids: Vec<String>,
    pub updated_at: BlockNumber,
}


impl Operator {
    pub const MAX_NOMINATORS: usize = 256;

    pub fn new(id: &str, updated_at: BlockNumber) -> Self {
        Self {
            id: id.to_string(),
            signing_key: String::new(),
            domain_id: 0,
            minimum_nominator_stake: 0,
            nomination_tax: 0,
            total_stake: 0,
            total_shares: 0,
            status: OperatorStatus::Registered,
            nominator_ids: Vec::new(),
            updated_at
        }
    }

    pub fn has_nominator(&self, nominator_id: &str) -> bool {
        self.nominator_ids.iter().any(|id| id == nominator_id)
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nominator {
    pub id: String,
    pub account_id: String,
    pub operator_id: String,
    #[serde(with = "decimal")]
    pub stake: u128,
    #[serde(with = "decimal")]
    pub shares: u128,
    pub updated_at: BlockNumber,
}


impl Nominator {
    pub fn new(operator_id: &str, account_id: &str, updated_at: BlockNumber) -> Self {
        Self {
            id: sxp_primitives::nominator_id(operator_id, account_id),
            account_id: account_id.to_string(),
            operator_id: operator_id.to_string(),
            stake: 0,
            shares: 0,
            updated_at
        }
    }
}


/// Pallet that showed up in a call or event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleName {
    pub id: String,
    pub has_calls: bool,
    pub has_events: bool,
    pub created_at: BlockNumber,
}


impl ModuleName {
    pub fn new(module: &str, created_at: BlockNumber) -> Self {
        Self {
            id: module.to_string(),
            has_calls: false,
            has_events: false,
            created_at
        }
    }

    /// Pallet part of a `Pallet.item` name.
    pub fn of(name: &str) -> &str {
        name.split_once('.').map_or(name, |(module, _)| module)
    }
}
