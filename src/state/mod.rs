mod callout;
mod flags;
mod progress;
mod shared_state;


pub use callout::*;
pub use flags::*;
pub(crate) use progress::*;
pub(crate) use shared_state::*;
