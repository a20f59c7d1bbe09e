pub mod auction;
pub mod bidding;
pub mod clock;
pub mod commission;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod query;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod users;
