//! Backend-facing services of the storefront client.

pub mod commerce;
