mod archiving;
mod batch;
mod block;
mod cache;
mod call_tree;
mod error;
mod events;
mod extrinsic;
mod ingest;
mod module_name;


pub use archiving::*;
pub use batch::*;
pub use block::map_block;
pub use cache::EntityCache;
pub use call_tree::{build_call_tree, CallTree};
pub use error::*;
pub use events::{classify, map_events, EventClass, RewardKind, StakeChange};
pub use extrinsic::{group_calls, map_extrinsic};
pub use ingest::*;
