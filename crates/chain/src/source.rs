use crate::Block;
use futures::Stream;
use sxp_primitives::{Block as _, BlockNumber};


#[derive(Debug, Clone)]
pub struct BlockBatch {
    pub blocks: Vec<Block>,
    /// Whether the batch reaches the current chain tip.
    pub is_head: bool
}


impl BlockBatch {
    pub fn first_block(&self) -> Option<BlockNumber> {
        self.blocks.first().map(|b| b.number())
    }

    pub fn last_block(&self) -> Option<BlockNumber> {
        self.blocks.last().map(|b| b.number())
    }
}


pub trait BatchSource: Stream<Item = anyhow::Result<BlockBatch>> + Unpin {
    fn set_position(&mut self, next_block: BlockNumber, parent_block_hash: Option<String>);
}
