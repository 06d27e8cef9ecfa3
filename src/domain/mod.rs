//! Storefront logic kept independent of the HTTP and SQL layers.

pub mod account;
pub mod cart;
pub mod events;
pub mod filters;
pub mod status;
