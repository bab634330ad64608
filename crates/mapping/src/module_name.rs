use crate::cache::EntityCache;
use sxp_model::ModuleName;
use sxp_primitives::BlockNumber;
use sxp_store::Store;


#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum SeenIn {
    Call,
    Event
}


/// Records the pallet of a call or event name.
pub(crate) async fn register_module<S: Store>(
    cache: &mut EntityCache<'_, S>,
    name: &str,
    seen_in: SeenIn,
    block_height: BlockNumber
) -> anyhow::Result<()>
{
    let module = ModuleName::of(name);
    if module.is_empty() {
        return Ok(())
    }
    let entry = cache.get_or_create(module, || ModuleName::new(module, block_height)).await?;
    match seen_in {
        SeenIn::Call => entry.has_calls = true,
        SeenIn::Event => entry.has_events = true
    }
    Ok(())
}
