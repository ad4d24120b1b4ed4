//! Google contacts feed over HTTP.

pub mod api_types;
pub mod client;

pub use client::{GoogleContacts, DEFAULT_AUTH_URL, DEFAULT_FEED_URL};
