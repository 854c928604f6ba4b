//! Gatherly Payments - payment processing for the Gatherly ticketed-events platform.
//!
//! This crate computes how ticket and tip payments are split between the platform
//! and event hosts, issues payment intents against Stripe, reconciles asynchronous
//! success webhooks into durable state, and computes policy-driven partial refunds.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
