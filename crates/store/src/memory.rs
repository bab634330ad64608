use crate::{Page, Store};
use anyhow::{bail, Context};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use sxp_model::{
    Account, AccountRewards, Block, Call, Entity, EntityKind, EntitySet, Event, Extrinsic,
    ModuleName, Nominator, Operator, OperatorRewards
};
use sxp_primitives::BlockRef;
use tracing::debug;


#[derive(Default, Serialize, Deserialize)]
struct State {
    head: Option<BlockRef>,
    /// kind -> id -> JSON encoded entity
    records: BTreeMap<String, BTreeMap<String, String>>
}


struct Record {
    kind: EntityKind,
    id: String,
    value: String
}


/// In-process implementation of [Store] with optional JSON snapshot persistence.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>
}


impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a snapshot written by [MemoryStore::persist], or starts empty if there is none.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new())
        }
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        let state: State = serde_json::from_reader(reader).with_context(|| {
            format!("failed to read store snapshot {}", path.display())
        })?;
        Ok(Self {
            state: Mutex::new(state)
        })
    }

    /// Atomically replaces the snapshot at `path`.
    pub fn persist(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let dir = path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        {
            let state = self.state.lock();
            let mut writer = std::io::BufWriter::new(file.as_file_mut());
            serde_json::to_writer(&mut writer, &*state)?;
            writer.flush()?;
        }
        file.persist(path).with_context(|| {
            format!("failed to write store snapshot {}", path.display())
        })?;
        Ok(())
    }

    /// Last committed block.
    pub fn head(&self) -> Option<BlockRef> {
        self.state.lock().head.clone()
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.state.lock().records.get(kind.as_str()).map_or(0, |r| r.len())
    }

    fn write(&self, entities: &EntitySet, fail_on_existing: bool) -> anyhow::Result<()> {
        let records = encode_set(entities)?;
        let mut state = self.state.lock();

        if fail_on_existing {
            for rec in records.iter() {
                let exists = state.records
                    .get(rec.kind.as_str())
                    .map_or(false, |r| r.contains_key(&rec.id));
                if exists {
                    bail!("{} {} already exists", rec.kind, rec.id)
                }
            }
        }

        let count = records.len();
        for rec in records {
            state.records
                .entry(rec.kind.as_str().to_string())
                .or_default()
                .insert(rec.id, rec.value);
        }

        if let Some(block) = entities.blocks.values().next_back() {
            let is_ahead = state.head.as_ref().map_or(true, |h| h.number < block.height);
            if is_ahead {
                state.head = Some(BlockRef::new(block.height, &block.hash));
            }
        }

        debug!(entities = count, "wrote entities");
        Ok(())
    }

    fn read<E: Entity>(&self, id: &str) -> anyhow::Result<Option<E>> {
        let state = self.state.lock();
        let Some(value) = state.records.get(E::KIND.as_str()).and_then(|r| r.get(id)) else {
            return Ok(None)
        };
        let entity = serde_json::from_str(value).with_context(|| {
            format!("failed to decode stored {} {}", E::KIND, id)
        })?;
        Ok(Some(entity))
    }

    fn read_page<E: Entity>(&self, page: Page) -> anyhow::Result<Vec<E>> {
        let mut items = {
            let state = self.state.lock();
            let Some(records) = state.records.get(E::KIND.as_str()) else {
                return Ok(Vec::new())
            };
            records.values()
                .map(|value| serde_json::from_str::<E>(value))
                .collect::<Result<Vec<_>, _>>()?
        };
        items.sort_by(|a, b| {
            a.natural_order().cmp(&b.natural_order()).then_with(|| a.id().cmp(b.id()))
        });
        Ok(items.into_iter().skip(page.offset).take(page.limit).collect())
    }
}


impl Store for MemoryStore {
    fn get<'a, E: Entity>(&'a self, id: &'a str) -> BoxFuture<'a, anyhow::Result<Option<E>>> {
        futures::future::ready(self.read(id)).boxed()
    }

    fn save<'a>(&'a self, entities: &'a EntitySet) -> BoxFuture<'a, anyhow::Result<()>> {
        futures::future::ready(self.write(entities, false)).boxed()
    }

    fn insert<'a>(&'a self, entities: &'a EntitySet) -> BoxFuture<'a, anyhow::Result<()>> {
        futures::future::ready(self.write(entities, true)).boxed()
    }

    fn list<'a, E: Entity>(&'a self, page: Page) -> BoxFuture<'a, anyhow::Result<Vec<E>>> {
        futures::future::ready(self.read_page(page)).boxed()
    }
}


fn encode_set(set: &EntitySet) -> anyhow::Result<Vec<Record>> {
    let mut records = Vec::with_capacity(set.len());
    encode::<Block>(set, &mut records)?;
    encode::<Extrinsic>(set, &mut records)?;
    encode::<Call>(set, &mut records)?;
    encode::<Event>(set, &mut records)?;
    encode::<Account>(set, &mut records)?;
    encode::<AccountRewards>(set, &mut records)?;
    encode::<Operator>(set, &mut records)?;
    encode::<OperatorRewards>(set, &mut records)?;
    encode::<Nominator>(set, &mut records)?;
    encode::<ModuleName>(set, &mut records)?;
    Ok(records)
}


fn encode<E: Entity>(set: &EntitySet, out: &mut Vec<Record>) -> anyhow::Result<()> {
    for (id, entity) in E::entries(set) {
        out.push(Record {
            kind: E::KIND,
            id: id.clone(),
            value: serde_json::to_string(entity)?
        });
    }
    Ok(())
}
