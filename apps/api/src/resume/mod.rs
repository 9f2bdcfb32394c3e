pub mod completeness;
pub mod extract;
pub mod handlers;
pub mod impact;
pub mod models;
pub mod parser;
pub mod storage;
pub mod store;
