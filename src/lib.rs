//! Prepress - checkout funnel service for print orders
//!
//! Walks a customer from type selection through file delivery to the
//! payment hand-off. Session state lives in SQLite; the heavy lifting
//! (file storage, checkout links, invoicing) is delegated to the order
//! pipeline's webhooks.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flow;
pub mod handlers;
pub mod hooks;
pub mod models;
pub mod payments;
pub mod rate_limit;
pub mod util;
