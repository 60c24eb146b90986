pub mod chat;
pub mod lead;
pub mod visit;
