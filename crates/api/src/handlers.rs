pub mod availability;
pub mod chat;
pub mod leads;
pub mod visits;
