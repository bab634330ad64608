use crate::archiving::ArchivingFormulas;
use crate::cache::EntityCache;
use crate::error::{WarningKind, Warnings};
use crate::events::map_events;
use crate::extrinsic::{group_calls, map_extrinsic};
use serde_json::Value as JsonValue;
use sxp_chain::decode::{decode_amount, decode_digest_logs, decode_solution_range, DigestItem};
use sxp_chain::{Chain, StorageItem};
use sxp_model::{Account, Block};
use sxp_primitives::{block_id, BlockNumber};
use sxp_store::Store;


/// Storage values backing the block aggregates.
struct BlockState {
    digest: Result<Option<Vec<JsonValue>>, String>,
    solution_range: Result<u64, String>,
    storage_fees_escrow: Result<Option<u128>, String>,
    segments_count: Result<u64, String>
}


async fn read_block_state<C: Chain>(chain: &C, block: &sxp_chain::Block) -> BlockState {
    let hash = block.header.hash.as_str();
    let parent_hash = block.header.parent_hash.as_str();

    let (digest, solution_range, escrow, segments) = futures::join!(
        chain.get_storage(hash, &StorageItem::SystemDigest),
        chain.get_storage(parent_hash, &StorageItem::SolutionRanges),
        chain.get_storage(parent_hash, &StorageItem::StorageFeesEscrow),
        chain.get_storage(parent_hash, &StorageItem::SegmentsCount)
    );

    BlockState {
        digest: digest.map_err(|e| e.to_string()).and_then(|value| {
            value.map(|v| decode_digest_logs(&v)).transpose().map_err(|e| e.to_string())
        }),
        solution_range: required(solution_range, decode_solution_range),
        storage_fees_escrow: escrow.map_err(|e| e.to_string()).and_then(|value| {
            value.map(|v| decode_amount("storage fees escrow", &v)).transpose().map_err(|e| e.to_string())
        }),
        segments_count: required(segments, |v| {
            decode_amount("segments count", v).and_then(|count| {
                u64::try_from(count).map_err(|_| {
                    sxp_chain::decode::DecodeError::new("segments count", format!("{} is out of u64 range", count))
                })
            })
        })
    }
}


fn required<T, E: std::fmt::Display>(
    read: anyhow::Result<Option<JsonValue>>,
    decode: impl FnOnce(&JsonValue) -> Result<T, E>
) -> Result<T, String>
{
    match read {
        Ok(Some(value)) => decode(&value).map_err(|e| e.to_string()),
        Ok(None) => Err("value is absent".to_string()),
        Err(err) => Err(err.to_string())
    }
}


/// Picks the block author out of the digest logs.
fn find_author(
    warnings: &mut Warnings,
    block_height: BlockNumber,
    block_id: &str,
    logs: &[JsonValue]
) -> Option<String>
{
    let mut pre_runtime_seen = false;
    for log in logs {
        match DigestItem::decode(log) {
            Ok(item @ DigestItem::PreRuntime(_)) => {
                pre_runtime_seen = true;
                if let Some(author) = item.author() {
                    return Some(author)
                }
            },
            Ok(_) => {},
            Err(err) => {
                warnings.record(block_height, block_id, WarningKind::UndecodableDigestLog(err.to_string()))
            }
        }
    }
    let reason = if pre_runtime_seen {
        "pre-runtime digest carries no solution public key"
    } else {
        "no pre-runtime digest"
    };
    warnings.record(block_height, block_id, WarningKind::MissingAuthor(reason.to_string()));
    None
}


/// Assembles one block with its extrinsics, calls and events.
pub async fn map_block<S: Store, C: Chain>(
    chain: &C,
    formulas: &ArchivingFormulas,
    cache: &mut EntityCache<'_, S>,
    warnings: &mut Warnings,
    block: &sxp_chain::Block
) -> anyhow::Result<()>
{
    let header = &block.header;
    let height = header.height;
    let id = block_id(height);

    let mut groups = group_calls(height, &block.extrinsics, &block.calls)?;

    let mut extrinsics: Vec<&sxp_chain::Extrinsic> = block.extrinsics.iter().collect();
    extrinsics.sort_by_key(|ex| ex.index);

    let mut extrinsic_ids = Vec::with_capacity(extrinsics.len());
    for ex in extrinsics {
        let calls = groups.remove(&ex.index).unwrap_or_default();
        extrinsic_ids.push(map_extrinsic(cache, warnings, height, ex, calls).await?);
    }

    let state = read_block_state(chain, block).await;

    let logs = match state.digest {
        Ok(Some(logs)) => logs,
        Ok(None) => header.digest.logs.clone(),
        Err(reason) => {
            warnings.record(height, &id, WarningKind::StorageRead {
                item: StorageItem::SystemDigest.key(),
                reason
            });
            header.digest.logs.clone()
        }
    };
    let author_id = find_author(warnings, height, &id, &logs);
    if let Some(author) = author_id.as_ref() {
        cache.get_or_create(author, || Account::new(author, height)).await?.updated_at = height;
    }

    let formula = formulas.get(header.spec_version);

    let storage_fees_escrow = match state.storage_fees_escrow {
        Ok(escrow) => escrow,
        Err(reason) => {
            warnings.record(height, &id, WarningKind::StorageRead {
                item: StorageItem::StorageFeesEscrow.key(),
                reason
            });
            None
        }
    };

    let space_pledged = state.solution_range.and_then(|range| {
        formula
            .and_then(|f| f.space_pledged(range, storage_fees_escrow))
            .ok_or_else(|| format!("no pledge estimate for solution range {}", range))
    });

    let blockchain_size = state.segments_count.and_then(|count| {
        formula
            .and_then(|f| f.blockchain_size(count))
            .ok_or_else(|| format!("no history size for {} segments", count))
    });

    let (space_pledged, blockchain_size) = match (space_pledged, blockchain_size) {
        (Ok(space_pledged), Ok(blockchain_size)) => (space_pledged, blockchain_size),
        (space_pledged, blockchain_size) => {
            let previous = previous_aggregates(cache, height).await?;
            let space_pledged = space_pledged.unwrap_or_else(|reason| {
                warnings.record(height, &id, WarningKind::StorageRead {
                    item: StorageItem::SolutionRanges.key(),
                    reason
                });
                previous.0
            });
            let blockchain_size = blockchain_size.unwrap_or_else(|reason| {
                warnings.record(height, &id, WarningKind::StorageRead {
                    item: StorageItem::SegmentsCount.key(),
                    reason
                });
                previous.1
            });
            (space_pledged, blockchain_size)
        }
    };

    cache.insert(Block {
        id,
        height,
        hash: header.hash.clone(),
        parent_hash: header.parent_hash.clone(),
        timestamp: header.timestamp,
        spec_version: header.spec_version,
        author_id: author_id.clone(),
        space_pledged,
        blockchain_size,
        extrinsics_count: extrinsic_ids.len() as u32,
        events_count: block.events.len() as u32,
        extrinsic_ids
    })?;

    map_events(chain, cache, warnings, block, author_id.as_deref()).await
}


/// `(space_pledged, blockchain_size)` of the preceding block, zeros at genesis.
async fn previous_aggregates<S: Store>(
    cache: &mut EntityCache<'_, S>,
    height: BlockNumber
) -> anyhow::Result<(u128, u128)>
{
    if height == 0 {
        return Ok((0, 0))
    }
    let previous = cache.get::<Block>(&block_id(height - 1)).await?;
    Ok(previous.map_or((0, 0), |b| (b.space_pledged, b.blockchain_size)))
}
