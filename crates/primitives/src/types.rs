use std::fmt::{Display, Formatter};


pub type BlockNumber = u64;
pub type ItemIndex = u32;


#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct BlockRef {
    pub number: BlockNumber,
    pub hash: String
}


impl BlockRef {
    pub fn new(number: BlockNumber, hash: &str) -> Self {
        Self {
            number,
            hash: hash.to_string()
        }
    }

    pub fn set(&mut self, number: BlockNumber, hash: &str) {
        self.number = number;
        self.hash.clear();
        self.hash.push_str(hash)
    }
}


impl Display for BlockRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.number, self.hash)
    }
}


/// Stage of block execution an event was emitted in.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Phase {
    Initialization,
    ApplyExtrinsic,
    Finalization
}


pub struct DisplayBlockRefOption<'a>(pub Option<&'a BlockRef>);


impl<'a> Display for DisplayBlockRefOption<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(r) = self.0 {
            write!(f, "{}", r)
        } else {
            write!(f, "None")
        }
    }
}


pub trait Block {
    fn number(&self) -> BlockNumber;

    fn hash(&self) -> &str;

    fn parent_hash(&self) -> &str;

    fn to_ref(&self) -> BlockRef {
        BlockRef::new(self.number(), self.hash())
    }
}
