use crate::cache::EntityCache;
use crate::call_tree::build_call_tree;
use crate::error::{MalformedExtrinsicError, WarningKind, Warnings};
use std::collections::BTreeMap;
use sxp_chain::decode::decode_address;
use sxp_model::{Account, Extrinsic};
use sxp_primitives::{block_id, extrinsic_id, BlockNumber, ItemIndex};
use sxp_store::Store;


/// Splits block calls by the extrinsic they belong to.
///
/// Every call must point to an extrinsic of the same block
/// and every extrinsic index must occur once.
pub fn group_calls<'a>(
    block_height: BlockNumber,
    extrinsics: &[sxp_chain::Extrinsic],
    calls: &'a [sxp_chain::Call]
) -> anyhow::Result<BTreeMap<ItemIndex, Vec<&'a sxp_chain::Call>>>
{
    let mut groups: BTreeMap<ItemIndex, Vec<&sxp_chain::Call>> = BTreeMap::new();

    for ex in extrinsics {
        if groups.insert(ex.index, Vec::new()).is_some() {
            return Err(MalformedExtrinsicError::new(
                &extrinsic_id(block_height, ex.index),
                "extrinsic index occurs more than once in the block"
            ).into())
        }
    }

    for call in calls {
        match groups.get_mut(&call.extrinsic_index) {
            Some(group) => group.push(call),
            None => {
                return Err(MalformedExtrinsicError::new(
                    &extrinsic_id(block_height, call.extrinsic_index),
                    format!("call {} refers to a missing extrinsic", call.name)
                ).into())
            }
        }
    }

    Ok(groups)
}


/// Assembles one extrinsic together with its call tree and returns its id.
pub async fn map_extrinsic<S: Store>(
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    block_height: BlockNumber,
    ex: &sxp_chain::Extrinsic,
    calls: Vec<&sxp_chain::Call>
) -> anyhow::Result<String>
{
    let id = extrinsic_id(block_height, ex.index);

    let tree = build_call_tree(cache, warnings, block_height, ex.index, calls).await?;

    let signer_id = match ex.signature.as_ref() {
        None => None,
        Some(signature) => match decode_address(&signature.address) {
            Ok(address) => {
                let account = cache.get_or_create(&address, || Account::new(&address, block_height)).await?;
                account.updated_at = block_height;
                Some(address)
            },
            Err(err) => {
                warnings.record(block_height, &id, WarningKind::UndecodableSigner(err.to_string()));
                None
            }
        }
    };

    cache.insert(Extrinsic {
        id: id.clone(),
        block_id: block_id(block_height),
        block_height,
        index_in_block: ex.index,
        version: ex.version,
        success: ex.success,
        hash: ex.hash.clone(),
        signer_id,
        error: ex.error.clone(),
        fee: ex.fee,
        tip: ex.tip,
        call_id: tree.root_id
    })?;

    Ok(id)
}
