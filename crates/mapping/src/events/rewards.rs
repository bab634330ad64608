use super::EventScope;
use crate::cache::EntityCache;
use crate::error::{InvalidRewardAmountError, WarningKind, Warnings};
use serde_json::Value as JsonValue;
use sxp_chain::decode::decode_address;
use sxp_chain::serde::Amount;
use sxp_model::{Account, AccountRewards, OperatorRewards};
use sxp_store::Store;


#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RewardKind {
    Block,
    Vote
}


impl RewardKind {
    /// Event argument naming the rewarded account.
    pub fn recipient_arg(&self) -> &'static str {
        match self {
            RewardKind::Block => "blockAuthor",
            RewardKind::Vote => "voter"
        }
    }
}


fn parse_reward(scope: &EventScope<'_>, key: &str) -> Result<u128, InvalidRewardAmountError> {
    let value = scope.args.get(key).filter(|v| !v.is_null());
    let Some(value) = value else {
        return Err(InvalidRewardAmountError {
            event_id: scope.event_id.to_string(),
            value: None,
            reason: format!("`{}` argument is missing", key)
        })
    };
    Amount::from_json(value).map_err(|err| InvalidRewardAmountError {
        event_id: scope.event_id.to_string(),
        value: Some(value.clone()),
        reason: err.to_string()
    })
}


fn overflow(scope: &EventScope<'_>, value: &JsonValue) -> InvalidRewardAmountError {
    InvalidRewardAmountError {
        event_id: scope.event_id.to_string(),
        value: Some(value.clone()),
        reason: "reward total overflows u128".to_string()
    }
}


pub(super) async fn apply_account_reward<S: Store>(
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    scope: &EventScope<'_>,
    kind: RewardKind
) -> anyhow::Result<()>
{
    let amount = match parse_reward(scope, "reward") {
        Ok(amount) => amount,
        Err(err) => {
            scope.warn(warnings, WarningKind::InvalidRewardAmount(err));
            return Ok(())
        }
    };

    let recipient = match scope.args.get(kind.recipient_arg()) {
        Some(value) => match decode_address(value) {
            Ok(address) => address,
            Err(err) => {
                scope.warn(warnings, WarningKind::InvalidEventArgs(err.to_string()));
                return Ok(())
            }
        },
        None => match scope.author.filter(|_| scope.extrinsic_id.is_none()) {
            Some(author) => author.to_string(),
            None => {
                scope.warn(warnings, WarningKind::MissingRewardRecipient);
                return Ok(())
            }
        }
    };

    let height = scope.block_height;
    let rewards = cache.get_or_create(&recipient, || AccountRewards::new(&recipient, height)).await?;

    let totals = match kind {
        RewardKind::Block => rewards.block.checked_add(amount).map(|block| (block, rewards.vote)),
        RewardKind::Vote => rewards.vote.checked_add(amount).map(|vote| (rewards.block, vote))
    };
    let Some(((block, vote), total)) = totals.zip(rewards.amount.checked_add(amount)) else {
        let err = overflow(scope, &scope.args["reward"]);
        scope.warn(warnings, WarningKind::InvalidRewardAmount(err));
        return Ok(())
    };

    rewards.block = block;
    rewards.vote = vote;
    rewards.amount = total;
    rewards.updated_at = height;

    cache.get_or_create(&recipient, || Account::new(&recipient, height)).await?.updated_at = height;
    Ok(())
}


pub(super) async fn apply_operator_reward<S: Store>(
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    scope: &EventScope<'_>
) -> anyhow::Result<()>
{
    let operator_id = match scope.args.get("operatorId").map(Amount::from_json) {
        Some(Ok(id)) => id.to_string(),
        Some(Err(err)) => {
            scope.warn(warnings, WarningKind::InvalidEventArgs(format!("operatorId: {}", err)));
            return Ok(())
        },
        None => {
            scope.warn(warnings, WarningKind::InvalidEventArgs("operatorId is missing".to_string()));
            return Ok(())
        }
    };

    let amount = match parse_reward(scope, "reward") {
        Ok(amount) => amount,
        Err(err) => {
            scope.warn(warnings, WarningKind::InvalidRewardAmount(err));
            return Ok(())
        }
    };

    let height = scope.block_height;
    let rewards = cache.get_or_create(&operator_id, || OperatorRewards::new(&operator_id, height)).await?;

    match rewards.amount.checked_add(amount) {
        Some(total) => {
            rewards.amount = total;
            rewards.updated_at = height;
        },
        None => {
            let err = overflow(scope, &scope.args["reward"]);
            scope.warn(warnings, WarningKind::InvalidRewardAmount(err));
        }
    }
    Ok(())
}
