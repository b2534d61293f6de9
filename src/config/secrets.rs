//! Secret handling utilities.
//!
//! Re-exports secrecy types and provides helpers for working with
//! secrets in the arete context.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
