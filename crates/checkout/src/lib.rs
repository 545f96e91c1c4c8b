//! Naked Pineapple Checkout library.
//!
//! This crate provides the checkout service as a library, allowing it to be
//! tested and reused. The binary in `main.rs` only loads configuration,
//! wires collaborators and serves [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod seed;
pub mod service;
pub mod services;
pub mod state;

pub use config::CheckoutConfig;
pub use service::{CheckoutService, Collaborators};
pub use state::AppState;
