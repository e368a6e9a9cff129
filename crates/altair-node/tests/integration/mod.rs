//! Integration tests for the ALTAIR node
//!
//! Run with: cargo test -p altair-node --test integration

mod config_file;
mod flight;
