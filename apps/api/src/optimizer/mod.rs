pub mod handlers;
pub mod prompts;
pub mod report;
pub mod rewrite;
pub mod tone;
