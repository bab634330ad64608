use futures::future::BoxFuture;
use serde_json::Value as JsonValue;
use std::fmt::{Display, Formatter};


/// Storage items the mapping reads from the chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageItem {
    SystemDigest,
    SolutionRanges,
    StorageFeesEscrow,
    SegmentsCount,
    DomainsOperator(u64)
}


impl StorageItem {
    pub fn key(&self) -> String {
        match self {
            StorageItem::SystemDigest => "System.Digest".to_string(),
            StorageItem::SolutionRanges => "Subspace.SolutionRanges".to_string(),
            StorageItem::StorageFeesEscrow => "TransactionFees.CollectedStorageFeesEscrow".to_string(),
            StorageItem::SegmentsCount => "Subspace.SegmentCommitment.count".to_string(),
            StorageItem::DomainsOperator(id) => format!("Domains.Operators.{}", id)
        }
    }
}


impl Display for StorageItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}


/// Read access to chain state.
///
/// Returns `None` when the item is absent at the given block,
/// errors are reserved for transport or runtime level failures.
pub trait Chain: Sync {
    fn get_storage<'a>(
        &'a self,
        block_hash: &'a str,
        item: &'a StorageItem
    ) -> BoxFuture<'a, anyhow::Result<Option<JsonValue>>>;
}


impl<C: Chain + ?Sized> Chain for &C {
    fn get_storage<'a>(
        &'a self,
        block_hash: &'a str,
        item: &'a StorageItem
    ) -> BoxFuture<'a, anyhow::Result<Option<JsonValue>>> {
        (**self).get_storage(block_hash, item)
    }
}
