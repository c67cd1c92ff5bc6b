pub mod item;
pub mod state;

pub use item::*;
pub use state::*;
