//! HTTP service for the financial report analyzer.
//!
//! A thin axum wrapper over [`finreport_rag`]: upload + ingestion on one
//! route, retrieval-augmented Q&A on another. All heavy lifting lives in
//! the core crate.

pub mod api;
pub mod server;

pub use server::{AppState, ServerConfig, app_router, run_server};
