mod ids;
#[cfg(feature = "serde")]
pub mod serde;
mod types;


pub use ids::*;
pub use types::*;
