//! HTTP layer: routers, extractors and the response envelope.
//!
//! Handlers stay thin. They authenticate, deserialize, call one service
//! method and wrap the result; every business rule lives below them.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod common;
pub mod farmers;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod warehouse;

pub use common::ApiResponse;
