//! Message protocol and dispatch bridge for external UI consumers.

pub mod bridge;
pub mod messages;
