pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod jobs;
pub mod lexicon;
pub mod llm_client;
pub mod matching;
pub mod models;
pub mod optimizer;
pub mod resume;
pub mod routes;
pub mod state;
