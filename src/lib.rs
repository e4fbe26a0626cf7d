// src/lib.rs

//! University announcement relay library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
