//! Mail Sorter: inbound email classification and routing.

pub mod config;
pub mod error;
pub mod filter;
pub mod mail;
pub mod message;
pub mod pipeline;
pub mod storage;
pub mod trigger;
