mod exception_store;
mod result_store;


pub use exception_store::*;
pub use result_store::*;
