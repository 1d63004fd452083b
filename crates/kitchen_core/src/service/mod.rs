//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and notifier calls into use-case level APIs.
//! - Keep HTTP and CLI layers decoupled from storage details.

pub mod kitchen_service;
