use serde_json::Value as JsonValue;
use std::fmt::{Display, Formatter};
use sxp_primitives::BlockNumber;
use tracing::warn;


/// A call refers to a parent which did not precede it in the extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanCallError {
    pub call_id: String,
    pub parent_id: String
}


impl Display for OrphanCallError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "call {} refers to parent {} which was not seen before it", self.call_id, self.parent_id)
    }
}


impl std::error::Error for OrphanCallError {}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedExtrinsicError {
    pub extrinsic_id: String,
    pub reason: String
}


impl MalformedExtrinsicError {
    pub fn new(extrinsic_id: &str, reason: impl ToString) -> Self {
        Self {
            extrinsic_id: extrinsic_id.to_string(),
            reason: reason.to_string()
        }
    }
}


impl Display for MalformedExtrinsicError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "extrinsic {} is malformed: {}", self.extrinsic_id, self.reason)
    }
}


impl std::error::Error for MalformedExtrinsicError {}


#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRewardAmountError {
    pub event_id: String,
    pub value: Option<JsonValue>,
    pub reason: String
}


impl Display for InvalidRewardAmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.value.as_ref() {
            Some(value) => write!(f, "invalid reward amount {} in event {}: {}", value, self.event_id, self.reason),
            None => write!(f, "missing reward amount in event {}", self.event_id)
        }
    }
}


impl std::error::Error for InvalidRewardAmountError {}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominatorCapExceededError {
    pub operator_id: String,
    pub nominator_id: String
}


impl Display for NominatorCapExceededError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "operator {} already has the maximum number of nominators, rejected {}",
            self.operator_id,
            self.nominator_id
        )
    }
}


impl std::error::Error for NominatorCapExceededError {}


#[derive(Debug, Clone, PartialEq)]
pub enum WarningKind {
    MissingAuthor(String),
    StorageRead {
        item: String,
        reason: String
    },
    UndecodableOrigin(String),
    UndecodableSigner(String),
    UndecodableDigestLog(String),
    UnresolvedEventContext(String),
    UnrecognizedEvent(String),
    MissingRewardRecipient,
    InvalidRewardAmount(InvalidRewardAmountError),
    InvalidEventArgs(String),
    InvalidStakeChange(String),
    NominatorCapExceeded(NominatorCapExceededError)
}


impl Display for WarningKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::MissingAuthor(reason) => write!(f, "block author is unknown: {}", reason),
            WarningKind::StorageRead { item, reason } => {
                write!(f, "storage read of {} failed, falling back to the previous value: {}", item, reason)
            },
            WarningKind::UndecodableOrigin(err) => write!(f, "call origin dropped: {}", err),
            WarningKind::UndecodableSigner(err) => write!(f, "extrinsic signer dropped: {}", err),
            WarningKind::UndecodableDigestLog(err) => write!(f, "digest log skipped: {}", err),
            WarningKind::UnresolvedEventContext(msg) => write!(f, "event context dropped: {}", msg),
            WarningKind::UnrecognizedEvent(name) => write!(f, "unrecognized event {}", name),
            WarningKind::MissingRewardRecipient => write!(f, "reward has no recipient"),
            WarningKind::InvalidRewardAmount(err) => Display::fmt(err, f),
            WarningKind::InvalidEventArgs(err) => write!(f, "invalid event arguments: {}", err),
            WarningKind::InvalidStakeChange(msg) => write!(f, "stake change rejected: {}", msg),
            WarningKind::NominatorCapExceeded(err) => Display::fmt(err, f)
        }
    }
}


/// Non-fatal problem met while mapping a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub block_height: BlockNumber,
    pub entity_id: String,
    pub kind: WarningKind
}


impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "block {}, {}: {}", self.block_height, self.entity_id, self.kind)
    }
}


#[derive(Debug, Default)]
pub struct Warnings {
    items: Vec<Warning>
}


impl Warnings {
    pub fn record(&mut self, block_height: BlockNumber, entity_id: &str, kind: WarningKind) {
        warn!(
            block_height = block_height,
            entity_id = entity_id,
            "{}",
            kind
        );
        self.items.push(Warning {
            block_height,
            entity_id: entity_id.to_string(),
            kind
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}
