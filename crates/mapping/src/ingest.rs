use crate::batch::Processor;
use anyhow::ensure;
use futures::TryStreamExt;
use std::fmt::{Display, Formatter};
use sxp_chain::{BatchSource, Chain};
use sxp_primitives::{Block as _, BlockNumber, BlockRef, DisplayBlockRefOption};
use sxp_store::Store;
use tracing::{info, warn};


pub struct CommittedBatch {
    pub first_block: BlockNumber,
    pub last_block: BlockRef,
    pub is_head: bool,
    pub entities: usize,
    pub warnings: usize
}


impl Display for CommittedBatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{} ({} entities, {} warnings)",
            self.first_block,
            self.last_block,
            self.entities,
            self.warnings
        )
    }
}


/// Drives batches from a source through the processor into the store, one at a time.
pub struct Ingest<'a, S, C, B> {
    store: &'a S,
    processor: Processor<C>,
    source: B,
    head: Option<BlockRef>
}


impl<'a, S, C, B> Ingest<'a, S, C, B>
where
    S: Store,
    C: Chain,
    B: BatchSource
{
    /// Positions the source right after `head`, or at `first_block` when nothing is committed yet.
    pub fn new(
        store: &'a S,
        processor: Processor<C>,
        mut source: B,
        head: Option<BlockRef>,
        first_block: BlockNumber
    ) -> Self
    {
        match head.as_ref() {
            Some(head) => source.set_position(head.number + 1, Some(head.hash.clone())),
            None => source.set_position(first_block, None)
        }
        info!("starting ingestion after {}", DisplayBlockRefOption(head.as_ref()));
        Self {
            store,
            processor,
            source,
            head
        }
    }

    /// Processes and commits the next non-empty batch.
    ///
    /// Returns `None` once the source is exhausted.
    pub async fn step(&mut self) -> anyhow::Result<Option<CommittedBatch>> {
        loop {
            let Some(batch) = self.source.try_next().await? else {
                return Ok(None)
            };

            let Some(first) = batch.blocks.first() else {
                continue
            };

            if let Some(head) = self.head.as_ref() {
                ensure!(
                    head.number + 1 == first.number() && head.hash == first.parent_hash(),
                    "batch starting at {}#{} does not follow the committed head {}",
                    first.number(),
                    first.hash(),
                    head
                );
            }

            let output = self.processor.process_batch(self.store, &batch).await?;
            let Some(last_block) = output.last_block else {
                continue
            };

            self.store.save(&output.entities).await?;

            let committed = CommittedBatch {
                first_block: first.number(),
                last_block: last_block.clone(),
                is_head: batch.is_head,
                entities: output.entities.len(),
                warnings: output.warnings.len()
            };

            if committed.warnings > 0 {
                warn!("batch {} produced warnings", committed);
            } else {
                info!("committed batch {}", committed);
            }
            if committed.is_head {
                info!("reached the chain head at {}", last_block);
            }

            self.head = Some(last_block);
            return Ok(Some(committed))
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        while self.step().await?.is_some() {}
        Ok(())
    }
}
