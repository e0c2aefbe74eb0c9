//! Image-forensics report viewer.
//!
//! Fetches verification reports from the analysis backend, falls back to a
//! local cache of report pointers while the backend is still processing,
//! and renders the result as a web dashboard or in the terminal. Also ships
//! a development reverse proxy for the backend and a document database
//! smoke test.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod proxy;
pub mod server;
pub mod smoke;
pub mod viewer;
