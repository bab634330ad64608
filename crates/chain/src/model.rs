use serde::Deserialize;
use serde_json::Value as JsonValue;
use sxp_primitives::serde::decode_decimal_option;
use sxp_primitives::{BlockNumber, ItemIndex, Phase};


#[derive(Debug, Clone, Default, Deserialize)]
pub struct Digest {
    #[serde(default)]
    pub logs: Vec<JsonValue>,
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub hash: String,
    pub parent_hash: String,
    pub height: BlockNumber,
    #[serde(default)]
    pub digest: Digest,
    #[serde(default)]
    pub spec_version: u32,
    pub timestamp: Option<i64>,
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtrinsicSignature {
    pub address: JsonValue,
}


#[derive(Debug, Clone, Deserialize)]
pub struct Extrinsic {
    pub index: ItemIndex,
    pub version: u32,
    pub signature: Option<ExtrinsicSignature>,
    #[serde(deserialize_with = "decode_decimal_option", default)]
    pub fee: Option<u128>,
    #[serde(deserialize_with = "decode_decimal_option", default)]
    pub tip: Option<u128>,
    pub error: Option<JsonValue>,
    pub success: bool,
    pub hash: String,
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub extrinsic_index: ItemIndex,
    /// Position of the call inside the extrinsic call tree.
    /// The parent of a call has the same address without the last element.
    #[serde(default)]
    pub address: Vec<ItemIndex>,
    pub pos: ItemIndex,
    pub name: String,
    #[serde(default)]
    pub args: JsonValue,
    pub origin: Option<JsonValue>,
    pub error: Option<JsonValue>,
    pub success: bool,
}


impl Call {
    pub fn parent_address(&self) -> Option<&[ItemIndex]> {
        self.address.split_last().map(|(_, parent)| parent)
    }
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub index: ItemIndex,
    pub pos: ItemIndex,
    pub name: String,
    #[serde(default)]
    pub args: JsonValue,
    pub phase: Phase,
    pub extrinsic_index: Option<ItemIndex>,
    pub call_address: Option<Vec<ItemIndex>>,
}


#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub header: BlockHeader,
    #[serde(default)]
    pub extrinsics: Vec<Extrinsic>,
    #[serde(default)]
    pub calls: Vec<Call>,
    #[serde(default)]
    pub events: Vec<Event>,
}


impl sxp_primitives::Block for Block {
    fn number(&self) -> BlockNumber {
        self.header.height
    }

    fn hash(&self) -> &str {
        &self.header.hash
    }

    fn parent_hash(&self) -> &str {
        &self.header.parent_hash
    }
}
