use crate::{BatchSource, Block, BlockBatch, Chain, StorageItem};
use anyhow::{ensure, Context};
use futures::future::BoxFuture;
use futures::{FutureExt, Stream};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use std::path::Path;
use std::pin::Pin;
use std::task::Poll;
use sxp_primitives::{Block as _, BlockNumber};
use tracing::debug;


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveBlock {
    #[serde(flatten)]
    block: Block,
    /// Storage snapshot taken at this block's hash
    #[serde(default)]
    storage: BTreeMap<String, JsonValue>
}


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveBatch {
    blocks: Vec<ArchiveBlock>,
    #[serde(default)]
    is_head: bool
}


/// Pre-decoded chain data stored as JSON lines, one block batch per line.
///
/// Serves both as the batch source and as the storage facade,
/// storage reads are answered from the per-block snapshots.
pub struct FileArchive {
    batches: Vec<BlockBatch>,
    storage: HashMap<String, BTreeMap<String, JsonValue>>
}


impl FileArchive {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path.as_ref()).with_context(|| {
            format!("failed to open archive file {}", path.as_ref().display())
        })?;
        Self::read(std::io::BufReader::new(file))
    }

    pub fn read(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut batches = Vec::new();
        let mut storage = HashMap::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue
            }
            let batch: ArchiveBatch = serde_json::from_str(&line).with_context(|| {
                format!("failed to parse block batch on line {}", line_no + 1)
            })?;
            let mut blocks = Vec::with_capacity(batch.blocks.len());
            for item in batch.blocks {
                storage.insert(item.block.header.hash.clone(), item.storage);
                blocks.push(item.block);
            }
            batches.push(BlockBatch {
                blocks,
                is_head: batch.is_head
            });
        }

        debug!(batches = batches.len(), "loaded archive");

        Ok(Self {
            batches,
            storage
        })
    }

    pub fn stream(&self) -> ArchiveStream<'_> {
        ArchiveStream {
            batches: &self.batches,
            next_batch: 0,
            next_block: 0,
            parent_block_hash: None
        }
    }
}


impl Chain for FileArchive {
    fn get_storage<'a>(
        &'a self,
        block_hash: &'a str,
        item: &'a StorageItem
    ) -> BoxFuture<'a, anyhow::Result<Option<JsonValue>>> {
        let value = self.storage
            .get(block_hash)
            .and_then(|snapshot| snapshot.get(&item.key()))
            .cloned();
        futures::future::ready(Ok(value)).boxed()
    }
}


pub struct ArchiveStream<'a> {
    batches: &'a [BlockBatch],
    next_batch: usize,
    next_block: BlockNumber,
    parent_block_hash: Option<String>
}


impl<'a> ArchiveStream<'a> {
    fn next_batch(&mut self) -> Option<anyhow::Result<BlockBatch>> {
        while let Some(batch) = self.batches.get(self.next_batch) {
            self.next_batch += 1;

            let blocks: Vec<Block> = batch.blocks.iter()
                .filter(|b| b.number() >= self.next_block)
                .cloned()
                .collect();

            if blocks.is_empty() {
                continue
            }

            return Some(self.accept(blocks, batch.is_head))
        }
        None
    }

    fn accept(&mut self, blocks: Vec<Block>, is_head: bool) -> anyhow::Result<BlockBatch> {
        for block in blocks.iter() {
            if let Some(parent_hash) = self.parent_block_hash.as_ref() {
                ensure!(
                    block.parent_hash() == parent_hash,
                    "chain continuity was violated around block {}#{}",
                    block.number(),
                    block.hash()
                );
            }
            self.parent_block_hash = Some(block.hash().to_string());
            self.next_block = block.number() + 1;
        }
        Ok(BlockBatch {
            blocks,
            is_head
        })
    }
}


impl<'a> Stream for ArchiveStream<'a> {
    type Item = anyhow::Result<BlockBatch>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut std::task::Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.get_mut().next_batch())
    }
}


impl<'a> BatchSource for ArchiveStream<'a> {
    fn set_position(&mut self, next_block: BlockNumber, parent_block_hash: Option<String>) {
        self.next_batch = 0;
        self.next_block = next_block;
        self.parent_block_hash = parent_block_hash;
    }
}
