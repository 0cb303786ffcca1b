pub mod board;
pub mod routes;
pub mod setup;
pub mod store;
pub mod types;
