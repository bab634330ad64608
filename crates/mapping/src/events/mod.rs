mod rewards;
mod staking;


use crate::cache::EntityCache;
use crate::error::{WarningKind, Warnings};
use crate::module_name::{register_module, SeenIn};
use anyhow::ensure;
use serde_json::Value as JsonValue;
use sxp_chain::Chain;
use sxp_model::{Call, Event, Extrinsic};
use sxp_primitives::{block_id, call_id, event_id, extrinsic_id, BlockNumber, Phase};
use sxp_store::Store;


pub use rewards::RewardKind;
pub use staking::StakeChange;


#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventClass {
    Reward(RewardKind),
    OperatorReward,
    Stake(StakeChange),
    /// Belongs to a ledger relevant pallet, but has no handler
    Unrecognized,
    Generic
}


pub fn classify(name: &str) -> EventClass {
    let (pallet, method) = name.split_once('.').unwrap_or(("", name));
    match (pallet, method) {
        (_, "VoteReward") => EventClass::Reward(RewardKind::Vote),
        (_, "BlockReward") => EventClass::Reward(RewardKind::Block),
        ("Domains", "OperatorRewarded") => EventClass::OperatorReward,
        ("Domains", "OperatorRegistered") => EventClass::Stake(StakeChange::Register),
        ("Domains", "OperatorNominated") => EventClass::Stake(StakeChange::Nominate),
        ("Domains", "WithdrewStake") => EventClass::Stake(StakeChange::Withdraw),
        ("Domains", "OperatorDeregistered") => EventClass::Stake(StakeChange::Deregister),
        ("Domains", "OperatorSlashed") => EventClass::Stake(StakeChange::Slash),
        ("Rewards", _) => EventClass::Unrecognized,
        ("Domains", m) if m.starts_with("Operator") => EventClass::Unrecognized,
        _ => EventClass::Generic
    }
}


/// What a handler knows about the event it is applied to.
pub(crate) struct EventScope<'a> {
    pub block_height: BlockNumber,
    pub block_hash: &'a str,
    pub event_id: &'a str,
    pub extrinsic_id: Option<&'a str>,
    pub author: Option<&'a str>,
    pub args: &'a JsonValue
}


impl<'a> EventScope<'a> {
    pub fn warn(&self, warnings: &mut Warnings, kind: WarningKind) {
        warnings.record(self.block_height, self.event_id, kind)
    }
}


/// Stores the events of a block and applies their ledger side effects, in position order.
///
/// Extrinsics and calls of the block must already be in the cache.
pub async fn map_events<S: Store, C: Chain>(
    chain: &C,
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    block: &sxp_chain::Block,
    author: Option<&str>
) -> anyhow::Result<()>
{
    let block_height = block.header.height;

    let mut events: Vec<&sxp_chain::Event> = block.events.iter().collect();
    events.sort_by_key(|e| e.pos);

    for pair in events.windows(2) {
        ensure!(
            pair[0].pos < pair[1].pos,
            "events {} and {} of block {} share position {}",
            pair[0].index,
            pair[1].index,
            block_height,
            pair[1].pos
        );
    }

    for ev in events {
        let id = event_id(block_height, ev.index, ev.pos);
        let (extrinsic_id, call_id) = resolve_context(cache, warnings, block_height, &id, ev);

        cache.insert(Event {
            id: id.clone(),
            block_id: block_id(block_height),
            block_height,
            index_in_block: ev.index,
            name: ev.name.clone(),
            pos: ev.pos,
            phase: ev.phase,
            args: ev.args.clone(),
            extrinsic_id: extrinsic_id.clone(),
            call_id
        })?;
        register_module(cache, &ev.name, SeenIn::Event, block_height).await?;

        let scope = EventScope {
            block_height,
            block_hash: &block.header.hash,
            event_id: &id,
            extrinsic_id: extrinsic_id.as_deref(),
            author: author.filter(|_| ev.phase != Phase::ApplyExtrinsic),
            args: &ev.args
        };

        match classify(&ev.name) {
            EventClass::Reward(kind) => {
                rewards::apply_account_reward(cache, warnings, &scope, kind).await?
            },
            EventClass::OperatorReward => {
                rewards::apply_operator_reward(cache, warnings, &scope).await?
            },
            EventClass::Stake(change) => {
                staking::apply_stake_change(chain, cache, warnings, &scope, change).await?
            },
            EventClass::Unrecognized => {
                scope.warn(warnings, WarningKind::UnrecognizedEvent(ev.name.clone()))
            },
            EventClass::Generic => {}
        }
    }

    Ok(())
}


fn resolve_context<S: Store>(
    cache: &EntityCache<'_, S>,
    warnings: &mut Warnings,
    block_height: BlockNumber,
    event_id: &str,
    ev: &sxp_chain::Event
) -> (Option<String>, Option<String>)
{
    let Some(extrinsic_index) = ev.extrinsic_index else {
        if ev.call_address.is_some() {
            warnings.record(
                block_height,
                event_id,
                WarningKind::UnresolvedEventContext("call reference without an extrinsic".to_string())
            );
        }
        return (None, None)
    };

    let ex_id = extrinsic_id(block_height, extrinsic_index);
    if cache.cached::<Extrinsic>(&ex_id).is_none() {
        warnings.record(
            block_height,
            event_id,
            WarningKind::UnresolvedEventContext(format!("extrinsic {} is unknown", ex_id))
        );
        return (None, None)
    }

    let call_id = ev.call_address.as_ref().and_then(|address| {
        let id = call_id(block_height, extrinsic_index, address);
        if cache.cached::<Call>(&id).is_some() {
            Some(id)
        } else {
            warnings.record(
                block_height,
                event_id,
                WarningKind::UnresolvedEventContext(format!("call {} is unknown", id))
            );
            None
        }
    });

    (Some(ex_id), call_id)
}
