//! Cardpilot - Virtual-Card Spend-Management Backend
//!
//! This crate implements the integration layer of a virtual-card spend
//! management product: payment/expense provider adapters behind a uniform
//! capability contract, an explicitly constructed integration registry
//! orchestrating them, and a budget threshold monitor emitting
//! at-most-once-per-period alerts.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
