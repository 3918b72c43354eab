//! Floodgate - Distributed Rate Limiting
//!
//! This crate implements distributed rate limiting over a shared Redis store.
//! Independent callers on any number of hosts agree on whether a request
//! under a named limit may proceed by evaluating a leaky-bucket or
//! token-bucket state transition atomically, server side, against a single
//! key. No background process is required: capacity leaks or refills purely
//! as a function of elapsed wall-clock time.

pub mod config;
pub mod error;
pub mod limit;
pub mod simulator;
pub mod store;
