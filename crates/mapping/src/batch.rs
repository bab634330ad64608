use crate::archiving::ArchivingFormulas;
use crate::block::map_block;
use crate::cache::EntityCache;
use crate::error::{Warning, Warnings};
use anyhow::{ensure, Context};
use sxp_chain::{BlockBatch, Chain};
use sxp_model::EntitySet;
use sxp_primitives::{Block as _, BlockRef};
use sxp_store::Store;
use tracing::debug;


pub struct BatchOutput {
    pub entities: EntitySet,
    pub warnings: Vec<Warning>,
    /// `None` for an empty batch
    pub last_block: Option<BlockRef>
}


/// Turns block batches into entity sets.
///
/// Processing a batch has no effect outside of the returned output,
/// it is up to the caller to commit it.
pub struct Processor<C> {
    chain: C,
    formulas: ArchivingFormulas
}


impl<C: Chain> Processor<C> {
    pub fn new(chain: C) -> Self {
        Self {
            chain,
            formulas: ArchivingFormulas::default()
        }
    }

    pub fn with_formulas(mut self, formulas: ArchivingFormulas) -> Self {
        self.formulas = formulas;
        self
    }

    pub async fn process_batch<S: Store>(&self, store: &S, batch: &BlockBatch) -> anyhow::Result<BatchOutput> {
        let mut cache = EntityCache::new(store);
        let mut warnings = Warnings::default();
        let mut last_block: Option<BlockRef> = None;

        for block in batch.blocks.iter() {
            if let Some(prev) = last_block.as_ref() {
                ensure!(
                    prev.number + 1 == block.number() && prev.hash == block.parent_hash(),
                    "block {}#{} does not follow {}",
                    block.number(),
                    block.hash(),
                    prev
                );
            }

            map_block(&self.chain, &self.formulas, &mut cache, &mut warnings, block)
                .await
                .with_context(|| format!("failed to map block {}#{}", block.number(), block.hash()))?;

            debug!(block_number = block.number(), "mapped block");

            match last_block.as_mut() {
                Some(prev) => prev.set(block.number(), block.hash()),
                None => last_block = Some(block.to_ref())
            }
        }

        Ok(BatchOutput {
            entities: cache.into_entities(),
            warnings: warnings.into_vec(),
            last_block
        })
    }
}
