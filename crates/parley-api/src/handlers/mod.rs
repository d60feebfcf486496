//! HTTP handlers, grouped by resource.

pub mod attachments;
pub mod chat;
