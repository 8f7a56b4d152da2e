pub mod runtime;
pub mod manager;
pub mod loader;

pub use runtime::*;
pub use manager::*;
pub use loader::*;
