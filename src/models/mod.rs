// Re-export all model types from submodules
mod card;
mod common;
mod reference;

pub use card::*;
pub use common::*;
pub use reference::*;
