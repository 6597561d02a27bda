//! chat-autopilot - Session navigation engine for automated chats
//!
//! Drives conversations with external menu-driven chat bots on an operator's
//! behalf: one session per objective, a decision function picking each next
//! move, and a notification once the objective is met or abandoned.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
