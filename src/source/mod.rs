pub mod fetch;
pub mod media_source;

pub use fetch::*;
pub use media_source::*;
