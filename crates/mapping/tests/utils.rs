#![allow(dead_code)]

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use sxp_chain::{BlockBatch, Chain, StorageItem};
use sxp_mapping::{BatchOutput, Processor};
use sxp_primitives::{BlockNumber, ItemIndex};
use sxp_store::MemoryStore;


pub const AUTHOR: &str = "0x3812a0e72232b07cd2b249d512eec512783108b2d2cd06c00ef8710f112ed212";
pub const VOTER: &str = "0x38120f112ed212a0e72232b07cd2b249d512eec512783108b2d2cd06c00ef871";
pub const SIGNER: &str = "0x14682f9dea76a4dd47172a118eb29b9cf9976df7ade12f95709a7cd2e3d81d6c";
pub const SOLUTION_RANGE: u64 = 1_000_000;
pub const SEGMENTS: u64 = 3;


pub fn hash(height: BlockNumber) -> String {
    format!("0x{:064x}", height)
}


pub fn account(n: u32) -> String {
    format!("0x{:064x}", 0xacc0_0000_u64 + n as u64)
}


pub fn pre_runtime(author: Option<&str>) -> JsonValue {
    match author {
        Some(key) => json!({
            "__kind": "PreRuntime",
            "engine": "0x53554220",
            "preDigest": {"slot": 1, "solution": {"publicKey": key, "rewardAddress": key}}
        }),
        None => json!({"__kind": "PreRuntime"})
    }
}


/// Storage facade answering from a fixed table, with injectable failures.
#[derive(Default)]
pub struct MockChain {
    storage: HashMap<(String, String), Result<JsonValue, String>>
}


impl MockChain {
    /// Chain state where every block in `heights` sees the default consensus values at its parent.
    pub fn with_blocks(heights: impl IntoIterator<Item = BlockNumber>) -> Self {
        let mut chain = Self::default();
        for h in heights {
            let parent = hash(h.saturating_sub(1));
            chain.set(&parent, StorageItem::SolutionRanges, json!({"current": SOLUTION_RANGE, "next": null}));
            chain.set(&parent, StorageItem::SegmentsCount, json!(SEGMENTS));
            chain.set(&parent, StorageItem::StorageFeesEscrow, json!("5000"));
        }
        chain
    }

    pub fn set(&mut self, block_hash: &str, item: StorageItem, value: JsonValue) {
        self.storage.insert((block_hash.to_string(), item.key()), Ok(value));
    }

    pub fn fail(&mut self, block_hash: &str, item: StorageItem, message: &str) {
        self.storage.insert((block_hash.to_string(), item.key()), Err(message.to_string()));
    }
}


impl Chain for MockChain {
    fn get_storage<'a>(
        &'a self,
        block_hash: &'a str,
        item: &'a StorageItem
    ) -> BoxFuture<'a, anyhow::Result<Option<JsonValue>>> {
        let result = match self.storage.get(&(block_hash.to_string(), item.key())) {
            None => Ok(None),
            Some(Ok(value)) => Ok(Some(value.clone())),
            Some(Err(message)) => Err(anyhow::anyhow!("{}", message))
        };
        futures::future::ready(result).boxed()
    }
}


pub struct TestBlock {
    height: BlockNumber,
    digest: Vec<JsonValue>,
    extrinsics: Vec<JsonValue>,
    calls: Vec<JsonValue>,
    events: Vec<JsonValue>
}


impl TestBlock {
    pub fn new(height: BlockNumber) -> Self {
        Self {
            height,
            digest: vec![pre_runtime(Some(AUTHOR))],
            extrinsics: vec![],
            calls: vec![],
            events: vec![]
        }
    }

    pub fn digest(mut self, logs: Vec<JsonValue>) -> Self {
        self.digest = logs;
        self
    }

    pub fn extrinsic(mut self, index: ItemIndex, signer: Option<&str>) -> Self {
        self.extrinsics.push(json!({
            "index": index,
            "version": 4,
            "signature": signer.map(|s| json!({"address": {"__kind": "Id", "value": s}})),
            "fee": "1500",
            "tip": "0",
            "error": null,
            "success": true,
            "hash": format!("{}{:04x}", hash(self.height), index)
        }));
        self
    }

    pub fn call(
        mut self,
        extrinsic_index: ItemIndex,
        address: &[ItemIndex],
        pos: ItemIndex,
        name: &str,
        signer: Option<&str>
    ) -> Self
    {
        let origin = match signer {
            Some(s) => json!({"__kind": "system", "value": {"__kind": "Signed", "value": s}}),
            None => json!({"__kind": "system", "value": {"__kind": "None"}})
        };
        self.calls.push(json!({
            "extrinsicIndex": extrinsic_index,
            "address": address,
            "pos": pos,
            "name": name,
            "args": {},
            "origin": origin,
            "success": true
        }));
        self
    }

    pub fn event(
        mut self,
        index: ItemIndex,
        pos: ItemIndex,
        name: &str,
        extrinsic_index: Option<ItemIndex>,
        args: JsonValue
    ) -> Self
    {
        let phase = if extrinsic_index.is_some() {
            "ApplyExtrinsic"
        } else {
            "Finalization"
        };
        self.events.push(json!({
            "index": index,
            "pos": pos,
            "name": name,
            "phase": phase,
            "args": args,
            "extrinsicIndex": extrinsic_index,
            "callAddress": null
        }));
        self
    }

    /// Points the last added event to the call at `address`.
    pub fn in_call(mut self, address: &[ItemIndex]) -> Self {
        if let Some(event) = self.events.last_mut() {
            event["callAddress"] = json!(address);
        }
        self
    }

    pub fn build(self) -> sxp_chain::Block {
        serde_json::from_value(self.to_json()).unwrap()
    }

    pub fn to_json(self) -> JsonValue {
        json!({
            "header": {
                "hash": hash(self.height),
                "parentHash": hash(self.height.saturating_sub(1)),
                "height": self.height,
                "digest": {"logs": self.digest},
                "specVersion": 1,
                "timestamp": 1_700_000_000_000i64 + self.height as i64 * 6000
            },
            "extrinsics": self.extrinsics,
            "calls": self.calls,
            "events": self.events
        })
    }
}


pub fn batch(blocks: Vec<sxp_chain::Block>) -> BlockBatch {
    BlockBatch {
        blocks,
        is_head: false
    }
}


pub async fn process(chain: &MockChain, store: &MemoryStore, blocks: Vec<sxp_chain::Block>) -> anyhow::Result<BatchOutput> {
    Processor::new(chain).process_batch(store, &batch(blocks)).await
}
