//! Parsing of platform payloads into [`RawMessage`](crate::platform::RawMessage)s.
//!
//! - [`telegram`] - Telegram Desktop JSON exports

pub mod telegram;
