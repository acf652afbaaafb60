pub mod app;
pub mod common;
pub mod config;
pub mod domain;
pub mod logging;
pub mod pipeline;
pub mod storage;
