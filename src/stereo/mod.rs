mod compositor;
mod frame;
mod swap_chain;

pub use compositor::*;
pub use frame::*;
pub use swap_chain::*;
