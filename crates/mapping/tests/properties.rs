use proptest::prelude::*;
use serde_json::json;
use sxp_model::AccountRewards;
use sxp_store::{MemoryStore, Store};

mod utils;
use utils::*;


fn sample_block(height: u64) -> TestBlock {
    TestBlock::new(height)
        .extrinsic(0, Some(SIGNER))
        .call(0, &[], 1, "Utility.batch", Some(SIGNER))
        .call(0, &[0], 2, "Balances.transfer", Some(SIGNER))
        .call(0, &[1], 3, "Balances.transfer", Some(SIGNER))
        .event(0, 4, "Balances.Transfer", Some(0), json!({"amount": "10"}))
        .in_call(&[0])
        .extrinsic(1, None)
        .call(1, &[], 5, "Timestamp.set", None)
        .event(1, 6, "Rewards.VoteReward", None, json!({"reward": "7", "voter": VOTER}))
        .event(2, 7, "Rewards.BlockReward", None, json!({"reward": 11}))
}


#[tokio::test]
async fn reprocessing_is_deterministic() -> anyhow::Result<()> {
    let chain = MockChain::with_blocks(100..103);

    let mut outputs = Vec::new();
    for _ in 0..2 {
        let store = MemoryStore::new();
        let output = process(&chain, &store, vec![
            sample_block(100).build(),
            sample_block(101).build(),
            sample_block(102).build()
        ]).await?;
        outputs.push(serde_json::to_vec(&output.entities)?);
    }

    assert_eq!(outputs[0], outputs[1]);
    Ok(())
}


#[tokio::test]
async fn reprocessing_against_committed_state_is_deterministic() -> anyhow::Result<()> {
    let chain = MockChain::with_blocks(100..102);

    let mut outputs = Vec::new();
    for _ in 0..2 {
        let store = MemoryStore::new();
        let first = process(&chain, &store, vec![sample_block(100).build()]).await?;
        store.save(&first.entities).await?;
        let second = process(&chain, &store, vec![sample_block(101).build()]).await?;
        outputs.push(serde_json::to_vec(&second.entities)?);

        let rewards = second.entities.get::<AccountRewards>(VOTER).unwrap();
        assert_eq!(rewards.amount, 14);
        assert_eq!(store.get::<AccountRewards>(AUTHOR).await?.unwrap().block, 11);
    }

    assert_eq!(outputs[0], outputs[1]);
    Ok(())
}


#[derive(Debug, Clone)]
enum Reward {
    Vote(u64),
    Block(u64)
}


fn arb_rewards() -> impl Strategy<Value = Vec<Reward>> {
    prop::collection::vec(
        prop_oneof![
            any::<u64>().prop_map(Reward::Vote),
            any::<u64>().prop_map(Reward::Block),
        ],
        0..30
    )
}


proptest! {
    #[test]
    fn reward_totals_equal_event_sums(rewards in arb_rewards(), split in 0usize..30) {
        let chain = MockChain::with_blocks([1, 2]);
        let store = MemoryStore::new();
        let split = split.min(rewards.len());

        let blocks: Vec<TestBlock> = [(1, &rewards[..split]), (2, &rewards[split..])]
            .into_iter()
            .map(|(height, rewards)| {
                rewards.iter().enumerate().fold(TestBlock::new(height), |block, (i, reward)| {
                    let i = i as u32;
                    match reward {
                        Reward::Vote(amount) => block.event(i, i, "Rewards.VoteReward", None, json!({
                            "reward": amount.to_string(),
                            "voter": AUTHOR
                        })),
                        Reward::Block(amount) => block.event(i, i, "Subspace.BlockReward", None, json!({
                            "reward": amount
                        }))
                    }
                })
            })
            .collect();

        futures::executor::block_on(async {
            for block in blocks {
                let output = process(&chain, &store, vec![block.build()]).await.unwrap();
                store.save(&output.entities).await.unwrap();
            }
        });

        let vote: u128 = rewards.iter().map(|r| match r {
            Reward::Vote(a) => *a as u128,
            Reward::Block(_) => 0
        }).sum();
        let block: u128 = rewards.iter().map(|r| match r {
            Reward::Vote(_) => 0,
            Reward::Block(a) => *a as u128
        }).sum();

        let stored = futures::executor::block_on(store.get::<AccountRewards>(AUTHOR)).unwrap();
        match stored {
            Some(stored) => {
                prop_assert_eq!(stored.vote, vote);
                prop_assert_eq!(stored.block, block);
                prop_assert_eq!(stored.amount, vote + block);
            },
            None => prop_assert!(rewards.is_empty())
        }
    }
}
