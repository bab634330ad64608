use super::EventScope;
use crate::cache::EntityCache;
use crate::error::{NominatorCapExceededError, WarningKind, Warnings};
use anyhow::Context;
use serde::Deserialize;
use sxp_chain::decode::{decode_address, decode_json, decode_operator_details, OperatorDetails};
use sxp_chain::serde::Amount;
use sxp_chain::{Chain, StorageItem};
use sxp_model::{Account, Nominator, Operator, OperatorStatus};
use sxp_primitives::nominator_id;
use sxp_store::Store;
use tracing::debug;


#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StakeChange {
    Register,
    Nominate,
    Withdraw,
    Deregister,
    Slash
}


#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Amount")]
struct OperatorId(u64);


impl TryFrom<Amount> for OperatorId {
    type Error = String;

    fn try_from(value: Amount) -> Result<Self, Self::Error> {
        u64::try_from(value.0)
            .map(OperatorId)
            .map_err(|_| format!("operator id {} is out of range", value.0))
    }
}


impl OperatorId {
    fn key(&self) -> String {
        self.0.to_string()
    }
}


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisteredArgs {
    operator_id: OperatorId,
    domain_id: Option<u32>,
    signing_key: Option<String>,
    minimum_nominator_stake: Option<Amount>,
    nomination_tax: Option<u8>
}


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NominatedArgs {
    operator_id: OperatorId,
    nominator_id: serde_json::Value,
    amount: Amount
}


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithdrewArgs {
    operator_id: OperatorId,
    nominator_id: serde_json::Value,
    /// Everything is withdrawn when absent
    shares: Option<Amount>
}


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperatorArgs {
    operator_id: OperatorId
}


pub(super) async fn apply_stake_change<S: Store, C: Chain>(
    chain: &C,
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    scope: &EventScope<'_>,
    change: StakeChange
) -> anyhow::Result<()>
{
    match change {
        StakeChange::Register => {
            let Some(args) = decode_args::<RegisteredArgs>(warnings, scope) else {
                return Ok(())
            };
            register(chain, cache, warnings, scope, args).await
        },
        StakeChange::Nominate => {
            let Some(args) = decode_args::<NominatedArgs>(warnings, scope) else {
                return Ok(())
            };
            nominate(cache, warnings, scope, args).await
        },
        StakeChange::Withdraw => {
            let Some(args) = decode_args::<WithdrewArgs>(warnings, scope) else {
                return Ok(())
            };
            withdraw(cache, warnings, scope, args).await
        },
        StakeChange::Deregister => {
            let Some(args) = decode_args::<OperatorArgs>(warnings, scope) else {
                return Ok(())
            };
            deregister(cache, warnings, scope, args).await
        },
        StakeChange::Slash => {
            let Some(args) = decode_args::<OperatorArgs>(warnings, scope) else {
                return Ok(())
            };
            slash(cache, warnings, scope, args).await
        }
    }
}


fn decode_args<T: serde::de::DeserializeOwned>(warnings: &mut Warnings, scope: &EventScope<'_>) -> Option<T> {
    match decode_json("event arguments", scope.args) {
        Ok(args) => Some(args),
        Err(err) => {
            scope.warn(warnings, WarningKind::InvalidEventArgs(err.to_string()));
            None
        }
    }
}


fn reject(warnings: &mut Warnings, scope: &EventScope<'_>, msg: String) -> anyhow::Result<()> {
    scope.warn(warnings, WarningKind::InvalidStakeChange(msg));
    Ok(())
}


fn decode_nominator(warnings: &mut Warnings, scope: &EventScope<'_>, value: &serde_json::Value) -> Option<String> {
    match decode_address(value) {
        Ok(address) => Some(address),
        Err(err) => {
            scope.warn(warnings, WarningKind::InvalidEventArgs(err.to_string()));
            None
        }
    }
}


async fn load_operator_details<C: Chain>(
    chain: &C,
    warnings: &mut Warnings,
    scope: &EventScope<'_>,
    operator_id: OperatorId
) -> OperatorDetails
{
    let item = StorageItem::DomainsOperator(operator_id.0);
    let result = chain.get_storage(scope.block_hash, &item).await.and_then(|value| {
        value.map(|v| decode_operator_details(&v)).transpose().map_err(anyhow::Error::from)
    });
    match result {
        Ok(details) => details.unwrap_or_default(),
        Err(err) => {
            scope.warn(warnings, WarningKind::StorageRead {
                item: item.key(),
                reason: err.to_string()
            });
            OperatorDetails::default()
        }
    }
}


async fn register<S: Store, C: Chain>(
    chain: &C,
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    scope: &EventScope<'_>,
    args: RegisteredArgs
) -> anyhow::Result<()>
{
    let id = args.operator_id.key();
    if cache.get::<Operator>(&id).await?.is_some() {
        return reject(warnings, scope, format!("operator {} is already registered", id))
    }

    let details = load_operator_details(chain, warnings, scope, args.operator_id).await;

    let Some(signing_key) = details.signing_key.or(args.signing_key) else {
        return reject(warnings, scope, format!("signing key of operator {} is unknown", id))
    };
    let Some(domain_id) = details.current_domain_id.or(args.domain_id) else {
        return reject(warnings, scope, format!("domain of operator {} is unknown", id))
    };

    let height = scope.block_height;
    let operator = cache.get_or_create(&id, || Operator::new(&id, height)).await?;
    operator.signing_key = signing_key;
    operator.domain_id = domain_id;
    operator.minimum_nominator_stake = details.minimum_nominator_stake
        .or(args.minimum_nominator_stake)
        .unwrap_or_default()
        .0;
    operator.nomination_tax = details.nomination_tax.or(args.nomination_tax).unwrap_or(0);
    operator.total_stake = details.current_total_stake.unwrap_or_default().0;
    operator.total_shares = details.total_shares.unwrap_or_default().0;

    debug!(operator_id = %id, domain_id, "operator registered");
    Ok(())
}


async fn nominate<S: Store>(
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    scope: &EventScope<'_>,
    args: NominatedArgs
) -> anyhow::Result<()>
{
    let Some(account_id) = decode_nominator(warnings, scope, &args.nominator_id) else {
        return Ok(())
    };
    let operator_id = args.operator_id.key();
    let id = nominator_id(&operator_id, &account_id);
    let amount = args.amount.0;

    let (total_stake, total_shares, attached, nominators) = match cache.get::<Operator>(&operator_id).await? {
        Some(op) if op.status == OperatorStatus::Registered => {
            (op.total_stake, op.total_shares, op.has_nominator(&id), op.nominator_ids.len())
        },
        Some(op) => {
            return reject(warnings, scope, format!("operator {} is {:?}", operator_id, op.status))
        },
        None => {
            return reject(warnings, scope, format!("operator {} is unknown", operator_id))
        }
    };

    if !attached && nominators >= Operator::MAX_NOMINATORS {
        scope.warn(warnings, WarningKind::NominatorCapExceeded(NominatorCapExceededError {
            operator_id,
            nominator_id: id
        }));
        return Ok(())
    }

    let (stake, shares) = cache.get::<Nominator>(&id).await?
        .map_or((0, 0), |n| (n.stake, n.shares));

    let new_shares = if total_stake == 0 || total_shares == 0 {
        Some(amount)
    } else {
        amount.checked_mul(total_shares).map(|v| v / total_stake)
    };

    let update = new_shares.and_then(|new_shares| {
        Some((
            stake.checked_add(amount)?,
            shares.checked_add(new_shares)?,
            total_stake.checked_add(amount)?,
            total_shares.checked_add(new_shares)?
        ))
    });
    let Some((stake, shares, total_stake, total_shares)) = update else {
        return reject(warnings, scope, format!("nomination of {} overflows the stake of operator {}", amount, operator_id))
    };
    if new_shares == Some(0) {
        return reject(warnings, scope, format!("nomination of {} buys no shares of operator {}", amount, operator_id))
    }

    let height = scope.block_height;

    let nominator = cache.get_or_create(&id, || Nominator::new(&operator_id, &account_id, height)).await?;
    nominator.stake = stake;
    nominator.shares = shares;
    nominator.updated_at = height;

    cache.get_or_create(&account_id, || Account::new(&account_id, height)).await?.updated_at = height;

    let operator = cache.cached_mut::<Operator>(&operator_id).context("operator left the cache")?;
    operator.total_stake = total_stake;
    operator.total_shares = total_shares;
    operator.updated_at = height;
    if !attached {
        operator.nominator_ids.push(id);
    }
    Ok(())
}


async fn withdraw<S: Store>(
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    scope: &EventScope<'_>,
    args: WithdrewArgs
) -> anyhow::Result<()>
{
    let Some(account_id) = decode_nominator(warnings, scope, &args.nominator_id) else {
        return Ok(())
    };
    let operator_id = args.operator_id.key();
    let id = nominator_id(&operator_id, &account_id);

    let (total_stake, total_shares) = match cache.get::<Operator>(&operator_id).await? {
        Some(op) if op.status == OperatorStatus::Slashed => {
            return reject(warnings, scope, format!("operator {} is slashed", operator_id))
        },
        Some(op) if !op.has_nominator(&id) => {
            return reject(warnings, scope, format!("{} does not nominate operator {}", account_id, operator_id))
        },
        Some(op) => (op.total_stake, op.total_shares),
        None => {
            return reject(warnings, scope, format!("operator {} is unknown", operator_id))
        }
    };

    let Some(nominator) = cache.get::<Nominator>(&id).await? else {
        return reject(warnings, scope, format!("nominator {} is unknown", id))
    };

    let shares_out = args.shares.map_or(nominator.shares, |s| s.0);
    if shares_out > nominator.shares {
        let msg = format!("{} withdraws {} shares, but holds {}", id, shares_out, nominator.shares);
        return reject(warnings, scope, msg)
    }

    // The last shares take whatever stake is left, so both ledgers move together.
    let stake_out = if shares_out == nominator.shares {
        Some(nominator.stake)
    } else if total_shares == 0 {
        Some(0)
    } else {
        shares_out.checked_mul(total_stake).map(|v| v / total_shares)
    };
    let Some(stake_out) = stake_out.map(|v| v.min(nominator.stake).min(total_stake)) else {
        return reject(warnings, scope, format!("withdrawal of {} shares overflows", shares_out))
    };

    let height = scope.block_height;
    nominator.shares -= shares_out;
    nominator.stake -= stake_out;
    nominator.updated_at = height;
    let detach = nominator.shares == 0;

    let operator = cache.cached_mut::<Operator>(&operator_id).context("operator left the cache")?;
    operator.total_stake = total_stake.saturating_sub(stake_out);
    operator.total_shares = total_shares.saturating_sub(shares_out);
    operator.updated_at = height;
    if detach {
        operator.nominator_ids.retain(|n| n != &id);
    }
    Ok(())
}


async fn deregister<S: Store>(
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    scope: &EventScope<'_>,
    args: OperatorArgs
) -> anyhow::Result<()>
{
    let operator_id = args.operator_id.key();
    match cache.get::<Operator>(&operator_id).await? {
        Some(op) if op.status == OperatorStatus::Registered => {
            op.status = OperatorStatus::Deregistered;
            op.updated_at = scope.block_height;
            Ok(())
        },
        Some(op) => {
            let msg = format!("operator {} is {:?} already", operator_id, op.status);
            reject(warnings, scope, msg)
        },
        None => reject(warnings, scope, format!("operator {} is unknown", operator_id))
    }
}


async fn slash<S: Store>(
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    scope: &EventScope<'_>,
    args: OperatorArgs
) -> anyhow::Result<()>
{
    let operator_id = args.operator_id.key();
    let height = scope.block_height;

    let nominator_ids = match cache.get::<Operator>(&operator_id).await? {
        Some(op) if op.status == OperatorStatus::Slashed => {
            return reject(warnings, scope, format!("operator {} is slashed already", operator_id))
        },
        Some(op) => {
            op.status = OperatorStatus::Slashed;
            op.total_stake = 0;
            op.total_shares = 0;
            op.updated_at = height;
            std::mem::take(&mut op.nominator_ids)
        },
        None => {
            return reject(warnings, scope, format!("operator {} is unknown", operator_id))
        }
    };

    for id in nominator_ids {
        if let Some(nominator) = cache.get::<Nominator>(&id).await? {
            nominator.stake = 0;
            nominator.shares = 0;
            nominator.updated_at = height;
        }
    }
    Ok(())
}
