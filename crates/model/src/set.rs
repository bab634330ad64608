use crate::entities::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};


pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Sort key of the natural listing order, ties are broken by id.
    fn natural_order(&self) -> (u64, u64, u64);

    fn entries(set: &EntitySet) -> &BTreeMap<String, Self>;

    fn entries_mut(set: &mut EntitySet) -> &mut BTreeMap<String, Self>;
}


macro_rules! entity_set {
    (
        $(
            $field:ident: $entity:ident { |$e:ident| $order:expr }
        ),* $(,)?
    ) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum EntityKind {
            $($entity),*
        }

        impl EntityKind {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(EntityKind::$entity => stringify!($entity)),*
                }
            }
        }

        /// Entities produced by one batch, keyed by id within each kind.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct EntitySet {
            $(pub $field: BTreeMap<String, $entity>),*
        }

        impl EntitySet {
            pub fn len(&self) -> usize {
                0 $(+ self.$field.len())*
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            pub fn count(&self, kind: EntityKind) -> usize {
                match kind {
                    $(EntityKind::$entity => self.$field.len()),*
                }
            }
        }

        $(
            impl Entity for $entity {
                const KIND: EntityKind = EntityKind::$entity;

                fn id(&self) -> &str {
                    &self.id
                }

                fn natural_order(&self) -> (u64, u64, u64) {
                    let $e = self;
                    $order
                }

                fn entries(set: &EntitySet) -> &BTreeMap<String, Self> {
                    &set.$field
                }

                fn entries_mut(set: &mut EntitySet) -> &mut BTreeMap<String, Self> {
                    &mut set.$field
                }
            }
        )*
    };
}


entity_set! {
    blocks: Block { |b| (b.height, 0, 0) },
    extrinsics: Extrinsic { |e| (e.block_height, e.index_in_block as u64, 0) },
    calls: Call { |c| (c.block_height, c.pos as u64, 0) },
    events: Event { |e| (e.block_height, e.pos as u64, 0) },
    accounts: Account { |_a| (0, 0, 0) },
    account_rewards: AccountRewards { |_r| (0, 0, 0) },
    operators: Operator { |o| (o.id.parse().unwrap_or(u64::MAX), 0, 0) },
    operator_rewards: OperatorRewards { |_r| (0, 0, 0) },
    nominators: Nominator { |_n| (0, 0, 0) },
    module_names: ModuleName { |m| (m.created_at, 0, 0) },
}


impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}


impl EntitySet {
    pub fn get<E: Entity>(&self, id: &str) -> Option<&E> {
        E::entries(self).get(id)
    }

    pub fn iter<E: Entity>(&self) -> impl Iterator<Item = &E> + '_ {
        E::entries(self).values()
    }

    pub fn insert<E: Entity>(&mut self, entity: E) -> Option<E> {
        E::entries_mut(self).insert(entity.id().to_string(), entity)
    }
}
