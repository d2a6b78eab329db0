// src/http/mod.rs
//
// HTTP sources for test data and documentation pages

pub mod client;

pub use client::{HttpError, HttpSource, ReqwestSource};
