pub mod chat;
pub mod message;
pub mod news;
pub mod session;
