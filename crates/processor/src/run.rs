use crate::cli::Cli;
use crate::config::Config;
use anyhow::Context;
use sxp_chain::FileArchive;
use sxp_mapping::{Ingest, Processor};
use sxp_model::EntityKind;
use sxp_store::{MemoryStore, Store};
use tracing::info;


pub async fn run(args: &Cli) -> anyhow::Result<()> {
    let config = Config::read_config_file(&args.config).context("failed to read processor config")?;

    let archive = FileArchive::open(&config.archive)?;
    let store = MemoryStore::load(&args.store)?;

    seed_genesis(&store, &config).await?;
    store.persist(&args.store)?;

    let processor = Processor::new(&archive).with_formulas(config.archiving_formulas());
    let mut ingest = Ingest::new(&store, processor, archive.stream(), store.head(), args.from_block);

    while ingest.step().await?.is_some() {
        store.persist(&args.store)?;
    }

    info!("archive is exhausted");
    Ok(())
}


/// Writes the configured genesis operators into a store which has none yet.
async fn seed_genesis(store: &MemoryStore, config: &Config) -> anyhow::Result<()> {
    if store.head().is_some() || store.len(EntityKind::Operator) > 0 {
        return Ok(())
    }
    let entities = config.genesis_entities();
    if entities.is_empty() {
        return Ok(())
    }
    store.insert(&entities).await.context("failed to seed genesis operators")?;
    info!(operators = entities.len(), "seeded genesis operators");
    Ok(())
}
