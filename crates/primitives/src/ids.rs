//! Deterministic entity ids.
//!
//! Every id is derived from the block height and item indexes only, zero padded,
//! so that re-processing a block yields the same ids and lexicographic order of
//! ids matches the natural order of the items.

use crate::{BlockNumber, ItemIndex};


pub fn block_id(height: BlockNumber) -> String {
    format!("{:010}", height)
}


pub fn extrinsic_id(height: BlockNumber, index: ItemIndex) -> String {
    format!("{:010}-{:06}", height, index)
}


/// The root call (empty address) shares its id with the extrinsic.
pub fn call_id(height: BlockNumber, extrinsic_index: ItemIndex, address: &[ItemIndex]) -> String {
    let mut id = extrinsic_id(height, extrinsic_index);
    for idx in address {
        id.push_str(&format!("-{:06}", idx));
    }
    id
}


pub fn event_id(height: BlockNumber, index: ItemIndex, pos: ItemIndex) -> String {
    format!("{:010}-{:06}-{:06}", height, index, pos)
}


pub fn nominator_id(operator_id: &str, account_id: &str) -> String {
    format!("{}-{}", operator_id, account_id)
}
