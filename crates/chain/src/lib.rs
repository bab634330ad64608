mod archive;
pub mod decode;
mod model;
pub mod serde;
mod source;
mod storage;


pub use archive::*;
pub use model::*;
pub use source::*;
pub use storage::*;

pub use serde_json::Value as JsonValue;
