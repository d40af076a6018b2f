//! Formatters module - converts chat transcripts into note bodies.

pub mod enml;

pub use enml::{chat_to_enml, escape_xml, EnmlDocument};
