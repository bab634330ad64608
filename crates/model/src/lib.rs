mod entities;
mod set;


pub use entities::*;
pub use set::*;
