pub mod dedup;
pub mod handlers;
pub mod jd_parser;
pub mod store;
