pub mod fit_scoring;
pub mod handlers;
pub mod recommend;
