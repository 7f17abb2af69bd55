mod future;
mod interface;


pub use future::*;
pub use interface::*;
