use crate::cache::EntityCache;
use crate::error::{MalformedExtrinsicError, OrphanCallError, WarningKind, Warnings};
use crate::module_name::{register_module, SeenIn};
use std::collections::HashMap;
use sxp_chain::decode;
use sxp_model::{Call, CallOrigin, OriginKind};
use sxp_primitives::{block_id, call_id, BlockNumber, ItemIndex};
use sxp_store::Store;


/// Ids of the calls of one extrinsic, in position order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallTree {
    pub root_id: Option<String>,
    pub call_ids: Vec<String>
}


/// Rebuilds the call forest of one extrinsic and registers its calls in the cache.
///
/// Calls are linked through their addresses: the parent of a call is
/// the call whose address is the child's one without the last element.
/// Every parent must precede its children in position order.
/// The pallet of every call is recorded as a [sxp_model::ModuleName].
pub async fn build_call_tree<S: Store>(
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    block_height: BlockNumber,
    extrinsic_index: ItemIndex,
    mut calls: Vec<&sxp_chain::Call>
) -> anyhow::Result<CallTree>
{
    let extrinsic_id = sxp_primitives::extrinsic_id(block_height, extrinsic_index);
    let block_id = block_id(block_height);

    calls.sort_by_key(|c| c.pos);

    let mut seen: HashMap<&[ItemIndex], String> = HashMap::with_capacity(calls.len());
    let mut tree = CallTree {
        root_id: None,
        call_ids: Vec::with_capacity(calls.len())
    };
    let mut prev_pos = None;

    for call in calls {
        let id = call_id(block_height, extrinsic_index, &call.address);

        if prev_pos == Some(call.pos) {
            return Err(MalformedExtrinsicError::new(
                &extrinsic_id,
                format!("calls share position {}", call.pos)
            ).into())
        }
        prev_pos = Some(call.pos);

        if seen.contains_key(call.address.as_slice()) {
            return Err(MalformedExtrinsicError::new(
                &extrinsic_id,
                format!("call {} occurs more than once", id)
            ).into())
        }

        let parent_id = match call.parent_address() {
            None => {
                if let Some(root_id) = tree.root_id.as_ref() {
                    return Err(MalformedExtrinsicError::new(
                        &extrinsic_id,
                        format!("call {} is a second root next to {}", id, root_id)
                    ).into())
                }
                None
            },
            Some(parent_address) => match seen.get(parent_address) {
                Some(parent_id) => Some(parent_id.clone()),
                None => {
                    return Err(OrphanCallError {
                        parent_id: call_id(block_height, extrinsic_index, parent_address),
                        call_id: id
                    }.into())
                }
            }
        };

        let origin = match call.origin.as_ref().map(decode::CallOrigin::decode) {
            None => None,
            Some(Ok(origin)) => Some(map_origin(origin)),
            Some(Err(err)) => {
                warnings.record(block_height, &id, WarningKind::UndecodableOrigin(err.to_string()));
                None
            }
        };

        cache.insert(Call {
            id: id.clone(),
            block_id: block_id.clone(),
            block_height,
            extrinsic_id: extrinsic_id.clone(),
            parent_id: parent_id.clone(),
            name: call.name.clone(),
            pos: call.pos,
            success: call.success,
            error: call.error.clone(),
            args: call.args.clone(),
            origin
        })?;
        register_module(cache, &call.name, SeenIn::Call, block_height).await?;

        if parent_id.is_none() {
            tree.root_id = Some(id.clone());
        }
        seen.insert(call.address.as_slice(), id.clone());
        tree.call_ids.push(id);
    }

    Ok(tree)
}


fn map_origin(origin: decode::CallOrigin) -> CallOrigin {
    match origin {
        decode::CallOrigin::Signed(address) => CallOrigin {
            kind: OriginKind::Signed,
            address: Some(address)
        },
        decode::CallOrigin::None => CallOrigin {
            kind: OriginKind::None,
            address: None
        },
        decode::CallOrigin::Root => CallOrigin {
            kind: OriginKind::Root,
            address: None
        }
    }
}
