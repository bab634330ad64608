use serde_json::json;
use sxp_chain::StorageItem;
use sxp_mapping::{
    ArchivingFormula, MalformedExtrinsicError, OrphanCallError, SubspaceArchiving, WarningKind
};
use sxp_model::{
    Account, AccountRewards, Block, Call, EntitySet, Event, Extrinsic, ModuleName, OriginKind
};
use sxp_primitives::Phase;
use sxp_store::{MemoryStore, Store};

mod utils;
use utils::*;


fn expected_space_pledged() -> u128 {
    SubspaceArchiving::default().space_pledged(SOLUTION_RANGE, None).unwrap()
}


fn expected_blockchain_size() -> u128 {
    SubspaceArchiving::default().blockchain_size(SEGMENTS).unwrap()
}


#[tokio::test]
async fn vote_reward_in_finalization() -> anyhow::Result<()> {
    let chain = MockChain::with_blocks([700560]);
    let store = MemoryStore::new();

    let mut committed = EntitySet::default();
    let mut prior = AccountRewards::new(VOTER, 700000);
    prior.vote = 7;
    prior.amount = 7;
    committed.insert(prior);
    store.save(&committed).await?;

    let block = TestBlock::new(700560)
        .event(54, 82, "Rewards.VoteReward", None, json!({
            "reward": "100000000000000000",
            "voter": VOTER
        }))
        .build();

    let output = process(&chain, &store, vec![block]).await?;
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);

    let rewards = output.entities.get::<AccountRewards>(VOTER).unwrap();
    assert_eq!(rewards.amount, 7 + 100000000000000000);
    assert_eq!(rewards.vote, 7 + 100000000000000000);
    assert_eq!(rewards.block, 0);
    assert_eq!(rewards.updated_at, 700560);
    assert_eq!(output.entities.get::<Account>(VOTER).unwrap().updated_at, 700560);

    let events: Vec<&Event> = output.entities.iter::<Event>().collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "0000700560-000054-000082");
    assert_eq!(events[0].phase, Phase::Finalization);
    assert_eq!(events[0].pos, 82);
    assert_eq!(events[0].extrinsic_id, None);
    Ok(())
}


#[tokio::test]
async fn signed_parent_and_child_calls() -> anyhow::Result<()> {
    let chain = MockChain::with_blocks([10]);
    let store = MemoryStore::new();

    let block = TestBlock::new(10)
        .extrinsic(0, Some(SIGNER))
        .call(0, &[], 1, "Pallet.parent_call", Some(SIGNER))
        .call(0, &[0], 2, "Pallet.child_call", Some(SIGNER))
        .event(0, 3, "System.ExtrinsicSuccess", Some(0), json!({}))
        .in_call(&[])
        .build();

    let output = process(&chain, &store, vec![block]).await?;
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    let entities = &output.entities;

    let calls: Vec<&Call> = entities.iter::<Call>().collect();
    assert_eq!(calls.len(), 2);
    let parent = calls.iter().find(|c| c.name == "Pallet.parent_call").unwrap();
    let child = calls.iter().find(|c| c.name == "Pallet.child_call").unwrap();
    assert_eq!(parent.parent_id, None);
    assert_eq!(child.parent_id.as_ref(), Some(&parent.id));
    let origin = parent.origin.as_ref().unwrap();
    assert_eq!(origin.kind, OriginKind::Signed);
    assert_eq!(origin.address.as_deref(), Some(SIGNER));

    let extrinsic = entities.get::<Extrinsic>("0000000010-000000").unwrap();
    assert_eq!(extrinsic.call_id.as_ref(), Some(&parent.id));
    assert_eq!(extrinsic.signer_id.as_deref(), Some(SIGNER));
    assert_eq!(extrinsic.fee, Some(1500));

    let event = entities.iter::<Event>().next().unwrap();
    assert_eq!(event.extrinsic_id.as_deref(), Some("0000000010-000000"));
    assert_eq!(event.call_id.as_ref(), Some(&parent.id));

    let block = entities.get::<Block>("0000000010").unwrap();
    assert_eq!(block.author_id.as_deref(), Some(AUTHOR));
    assert_eq!(block.extrinsic_ids, vec!["0000000010-000000".to_string()]);
    assert_eq!(block.extrinsics_count, 1);
    assert_eq!(block.events_count, 1);
    assert_eq!(block.space_pledged, expected_space_pledged());
    assert_eq!(block.blockchain_size, expected_blockchain_size());

    assert!(entities.get::<Account>(SIGNER).is_some());
    assert!(entities.get::<Account>(AUTHOR).is_some());
    Ok(())
}


#[tokio::test]
async fn digest_without_author_key() -> anyhow::Result<()> {
    let mut chain = MockChain::with_blocks([5]);
    chain.set(&hash(5), StorageItem::SystemDigest, json!({
        "logs": [{"__kind": "Consensus"}, {"__kind": "PreRuntime"}]
    }));
    let store = MemoryStore::new();

    let output = process(&chain, &store, vec![TestBlock::new(5).build()]).await?;

    let block = output.entities.get::<Block>("0000000005").unwrap();
    assert_eq!(block.author_id, None);
    assert_eq!(output.warnings.len(), 1);
    assert_eq!(output.warnings[0].block_height, 5);
    assert_eq!(output.warnings[0].entity_id, "0000000005");
    assert!(matches!(output.warnings[0].kind, WarningKind::MissingAuthor(_)));
    assert!(output.entities.get::<Account>(AUTHOR).is_none());
    Ok(())
}


#[tokio::test]
async fn block_reward_goes_to_author() -> anyhow::Result<()> {
    let chain = MockChain::with_blocks([3]);
    let store = MemoryStore::new();

    let block = TestBlock::new(3)
        .event(0, 1, "Rewards.BlockReward", None, json!({"reward": 20}))
        .event(1, 2, "Rewards.BlockReward", None, json!({"reward": "22", "blockAuthor": VOTER}))
        .build();

    let output = process(&chain, &store, vec![block]).await?;
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);

    let author = output.entities.get::<AccountRewards>(AUTHOR).unwrap();
    assert_eq!((author.block, author.vote, author.amount), (20, 0, 20));
    let voter = output.entities.get::<AccountRewards>(VOTER).unwrap();
    assert_eq!((voter.block, voter.vote, voter.amount), (22, 0, 22));
    Ok(())
}


#[tokio::test]
async fn module_names_from_calls_and_events() -> anyhow::Result<()> {
    let chain = MockChain::with_blocks([10, 11]);
    let store = MemoryStore::new();

    let block = TestBlock::new(10)
        .extrinsic(0, Some(SIGNER))
        .call(0, &[], 1, "Balances.transfer", Some(SIGNER))
        .event(0, 2, "Balances.Transfer", Some(0), json!({}))
        .event(1, 3, "System.ExtrinsicSuccess", Some(0), json!({}))
        .build();
    let output = process(&chain, &store, vec![block]).await?;
    store.save(&output.entities).await?;

    let balances = output.entities.get::<ModuleName>("Balances").unwrap();
    assert!(balances.has_calls && balances.has_events);
    let system = output.entities.get::<ModuleName>("System").unwrap();
    assert!(!system.has_calls && system.has_events);

    let block = TestBlock::new(11)
        .extrinsic(0, Some(SIGNER))
        .call(0, &[], 1, "System.remark", Some(SIGNER))
        .build();
    let output = process(&chain, &store, vec![block]).await?;
    store.save(&output.entities).await?;

    let system = store.get::<ModuleName>("System").await?.unwrap();
    assert!(system.has_calls && system.has_events);
    assert_eq!(system.created_at, 10);
    assert_eq!(store.get::<ModuleName>("Balances").await?.unwrap().created_at, 10);
    Ok(())
}


#[tokio::test]
async fn invalid_rewards_are_skipped() -> anyhow::Result<()> {
    let chain = MockChain::with_blocks([3]);
    let store = MemoryStore::new();

    let block = TestBlock::new(3)
        .extrinsic(0, None)
        .event(0, 1, "Rewards.VoteReward", None, json!({"reward": "-5", "voter": VOTER}))
        .event(1, 2, "Rewards.VoteReward", None, json!({"reward": 1.5, "voter": VOTER}))
        .event(2, 3, "Rewards.VoteReward", None, json!({"voter": VOTER}))
        .event(3, 4, "Rewards.VoteReward", Some(0), json!({"reward": "10"}))
        .event(4, 5, "Rewards.VoteReward", None, json!({"reward": "10", "voter": "someone"}))
        .build();

    let output = process(&chain, &store, vec![block]).await?;

    assert_eq!(output.entities.count(sxp_model::EntityKind::Event), 5);
    assert!(output.entities.get::<AccountRewards>(VOTER).is_none());

    let kinds: Vec<&WarningKind> = output.warnings.iter().map(|w| &w.kind).collect();
    assert_eq!(kinds.len(), 5);
    assert!(kinds[..3].iter().all(|k| matches!(k, WarningKind::InvalidRewardAmount(_))));
    assert_eq!(kinds[3], &WarningKind::MissingRewardRecipient);
    assert!(matches!(kinds[4], WarningKind::InvalidEventArgs(_)));
    assert_eq!(output.warnings[0].entity_id, "0000000003-000000-000001");
    Ok(())
}


#[tokio::test]
async fn recipients_differing_in_case_share_one_account() -> anyhow::Result<()> {
    let chain = MockChain::with_blocks([3]);
    let store = MemoryStore::new();

    let shouting = VOTER.to_uppercase().replacen("0X", "0x", 1);
    let block = TestBlock::new(3)
        .event(0, 1, "Rewards.VoteReward", None, json!({"reward": "10", "voter": VOTER}))
        .event(1, 2, "Rewards.VoteReward", None, json!({"reward": "5", "voter": shouting}))
        .event(2, 3, "Rewards.VoteReward", None, json!({"reward": "1", "voter": "0x1"}))
        .build();

    let output = process(&chain, &store, vec![block]).await?;

    assert_eq!(output.entities.count(sxp_model::EntityKind::AccountRewards), 1);
    assert_eq!(output.entities.get::<AccountRewards>(VOTER).unwrap().vote, 15);
    assert_eq!(output.warnings.len(), 1);
    assert!(matches!(output.warnings[0].kind, WarningKind::InvalidEventArgs(_)));
    Ok(())
}


#[tokio::test]
async fn unresolved_context_and_unknown_names() -> anyhow::Result<()> {
    let chain = MockChain::with_blocks([3]);
    let store = MemoryStore::new();

    let block = TestBlock::new(3)
        .extrinsic(0, None)
        .event(0, 1, "System.ExtrinsicSuccess", Some(4), json!({}))
        .event(1, 2, "System.ExtrinsicSuccess", Some(0), json!({}))
        .in_call(&[1])
        .event(2, 3, "Rewards.Unknown", None, json!({}))
        .build();

    let output = process(&chain, &store, vec![block]).await?;

    let events: Vec<&Event> = output.entities.iter::<Event>().collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].extrinsic_id, None);
    assert_eq!(events[1].extrinsic_id.as_deref(), Some("0000000003-000000"));
    assert_eq!(events[1].call_id, None);

    let kinds: Vec<&WarningKind> = output.warnings.iter().map(|w| &w.kind).collect();
    assert_eq!(kinds.len(), 3);
    assert!(matches!(kinds[0], WarningKind::UnresolvedEventContext(_)));
    assert!(matches!(kinds[1], WarningKind::UnresolvedEventContext(_)));
    assert_eq!(kinds[2], &WarningKind::UnrecognizedEvent("Rewards.Unknown".to_string()));
    Ok(())
}


#[tokio::test]
async fn failed_reads_fall_back_to_previous_block() -> anyhow::Result<()> {
    let mut chain = MockChain::with_blocks([1, 2, 3]);
    chain.fail(&hash(1), StorageItem::SolutionRanges, "rpc timeout");
    chain.set(&hash(2), StorageItem::SegmentsCount, json!("garbage"));
    let store = MemoryStore::new();

    let output = process(&chain, &store, vec![
        TestBlock::new(1).build(),
        TestBlock::new(2).build()
    ]).await?;

    let second = output.entities.get::<Block>("0000000002").unwrap();
    assert_eq!(second.space_pledged, expected_space_pledged());
    assert_eq!(output.warnings.len(), 1);
    assert!(matches!(&output.warnings[0].kind, WarningKind::StorageRead { item, .. } if item == "Subspace.SolutionRanges"));
    store.save(&output.entities).await?;

    // the previous block now comes from the store
    let output = process(&chain, &store, vec![TestBlock::new(3).build()]).await?;
    let third = output.entities.get::<Block>("0000000003").unwrap();
    assert_eq!(third.space_pledged, expected_space_pledged());
    assert_eq!(third.blockchain_size, expected_blockchain_size());
    assert_eq!(output.warnings.len(), 1);
    assert!(matches!(&output.warnings[0].kind, WarningKind::StorageRead { item, .. } if item == "Subspace.SegmentCommitment.count"));
    Ok(())
}


#[tokio::test]
async fn failed_reads_at_genesis_give_zero() -> anyhow::Result<()> {
    let chain = MockChain::default();
    let store = MemoryStore::new();

    let output = process(&chain, &store, vec![TestBlock::new(0).build()]).await?;
    let genesis = output.entities.get::<Block>("0000000000").unwrap();
    assert_eq!(genesis.space_pledged, 0);
    assert_eq!(genesis.blockchain_size, 0);
    assert_eq!(output.warnings.len(), 2);
    Ok(())
}


#[tokio::test]
async fn orphan_call_aborts_batch() {
    let chain = MockChain::with_blocks([8]);
    let store = MemoryStore::new();

    let block = TestBlock::new(8)
        .extrinsic(0, None)
        .call(0, &[], 1, "Utility.batch", None)
        .call(0, &[0, 0], 2, "Balances.transfer", None)
        .build();

    let err = process(&chain, &store, vec![block]).await.err().unwrap();
    let orphan = err.downcast_ref::<OrphanCallError>().unwrap();
    assert_eq!(orphan.parent_id, "0000000008-000000-000000");
}


#[tokio::test]
async fn call_of_missing_extrinsic_aborts_batch() {
    let chain = MockChain::with_blocks([8]);
    let store = MemoryStore::new();

    let block = TestBlock::new(8)
        .extrinsic(0, None)
        .call(3, &[], 1, "Timestamp.set", None)
        .build();

    let err = process(&chain, &store, vec![block]).await.err().unwrap();
    assert!(err.downcast_ref::<MalformedExtrinsicError>().is_some());
}


#[tokio::test]
async fn repeated_event_position_aborts_batch() {
    let chain = MockChain::with_blocks([8]);
    let store = MemoryStore::new();

    let block = TestBlock::new(8)
        .event(0, 4, "System.Remarked", None, json!({}))
        .event(1, 4, "System.Remarked", None, json!({}))
        .build();

    assert!(process(&chain, &store, vec![block]).await.is_err());
}


#[tokio::test]
async fn blocks_of_a_batch_must_be_chained() {
    let chain = MockChain::with_blocks([1, 3]);
    let store = MemoryStore::new();

    let result = process(&chain, &store, vec![
        TestBlock::new(1).build(),
        TestBlock::new(3).build()
    ]).await;

    assert!(result.is_err());
}
