mod memory;
mod types;


pub use memory::MemoryStore;
pub use types::*;
