pub mod definition;
pub mod version;

pub use definition::*;
pub use version::*;
