use anyhow::ensure;
use std::collections::btree_map::Entry;
use sxp_model::{Entity, EntitySet};
use sxp_store::Store;


/// Batch scoped identity map of entities.
///
/// Every component working on a batch goes through the same cache, so a given id
/// resolves to a single instance no matter how many times it is requested.
/// Misses fall through to the store, where previously committed state lives.
/// The cache is consumed by [EntityCache::into_entities] at the end of the batch.
pub struct EntityCache<'s, S> {
    store: &'s S,
    entities: EntitySet
}


impl<'s, S: Store> EntityCache<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            entities: EntitySet::default()
        }
    }

    /// Returns the cached entity, else the stored one, else the one built by `factory`.
    pub async fn get_or_create<E, F>(&mut self, id: &str, factory: F) -> anyhow::Result<&mut E>
    where
        E: Entity,
        F: FnOnce() -> E
    {
        let stored = if E::entries(&self.entities).contains_key(id) {
            None
        } else {
            self.store.get::<E>(id).await?
        };

        let entity = match E::entries_mut(&mut self.entities).entry(id.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let entity = stored.unwrap_or_else(factory);
                ensure!(
                    entity.id() == id,
                    "{} factory produced id {} instead of {}",
                    E::KIND,
                    entity.id(),
                    id
                );
                entry.insert(entity)
            }
        };

        Ok(entity)
    }

    /// Like [EntityCache::get_or_create], but never creates.
    pub async fn get<E: Entity>(&mut self, id: &str) -> anyhow::Result<Option<&mut E>> {
        if !E::entries(&self.entities).contains_key(id) {
            match self.store.get::<E>(id).await? {
                Some(entity) => {
                    E::entries_mut(&mut self.entities).insert(id.to_string(), entity);
                },
                None => return Ok(None)
            }
        }
        Ok(E::entries_mut(&mut self.entities).get_mut(id))
    }

    /// Registers a freshly assembled entity.
    ///
    /// Chain derived entities are created exactly once per batch,
    /// hence a second registration of the same id is an error.
    pub fn insert<E: Entity>(&mut self, entity: E) -> anyhow::Result<()> {
        let entries = E::entries_mut(&mut self.entities);
        ensure!(
            !entries.contains_key(entity.id()),
            "{} {} was registered twice",
            E::KIND,
            entity.id()
        );
        entries.insert(entity.id().to_string(), entity);
        Ok(())
    }

    pub fn cached<E: Entity>(&self, id: &str) -> Option<&E> {
        E::entries(&self.entities).get(id)
    }

    pub fn cached_mut<E: Entity>(&mut self, id: &str) -> Option<&mut E> {
        E::entries_mut(&mut self.entities).get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn into_entities(self) -> EntitySet {
        self.entities
    }
}
