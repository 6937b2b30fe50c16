//! Database entities (sea-orm models) for the FarmConnect marketplace.

pub mod address;
pub mod cart;
pub mod cart_item;
pub mod farmer_profile;
pub mod farmer_verification;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod order_tracking;
pub mod payment_transaction;
pub mod product;
pub mod review;
pub mod stock_movement;
pub mod user;
pub mod verification_otp;
pub mod warehouse;
pub mod warehouse_inventory;
