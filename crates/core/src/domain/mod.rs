pub mod chat;
pub mod counter_offer;
pub mod export;
pub mod project;
pub mod quote;
