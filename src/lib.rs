//! Typing practice sessions over pluggable, optionally adaptive text sources.
//!
//! A [`session::SessionController`] pulls lines from a
//! [`generator::WordSource`], validates keystrokes against them and hands a
//! [`session::SessionResult`] to a [`store::SessionStore`] once a limit is
//! reached.

pub mod config;
pub mod engine;
pub mod generator;
pub mod session;
pub mod store;
