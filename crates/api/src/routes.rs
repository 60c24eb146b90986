pub mod availability;
pub mod chat;
pub mod health;
pub mod leads;
pub mod visits;
