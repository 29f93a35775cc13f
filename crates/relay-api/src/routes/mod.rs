pub mod conversation;
pub mod generate;
pub mod health;
pub mod models;
pub mod stats;
