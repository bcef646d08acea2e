pub mod cards;
pub mod reference;
pub mod upload;
