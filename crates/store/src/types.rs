use futures::future::BoxFuture;
use sxp_model::{Entity, EntitySet};


#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize
}


impl Page {
    pub fn first(limit: usize) -> Self {
        Self {
            offset: 0,
            limit
        }
    }

    pub fn next(&self) -> Self {
        Self {
            offset: self.offset + self.limit,
            limit: self.limit
        }
    }
}


/// Key-addressed entity store.
///
/// All entities passed to a single `save` or `insert` call
/// become visible together or not at all.
pub trait Store: Sync {
    fn get<'a, E: Entity>(&'a self, id: &'a str) -> BoxFuture<'a, anyhow::Result<Option<E>>>;

    /// Upserts every entity of the set.
    fn save<'a>(&'a self, entities: &'a EntitySet) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Like `save`, but fails without writing anything if any of the ids is already taken.
    fn insert<'a>(&'a self, entities: &'a EntitySet) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Lists entities of one kind in their natural order.
    fn list<'a, E: Entity>(&'a self, page: Page) -> BoxFuture<'a, anyhow::Result<Vec<E>>>;
}
