//! HTTP middleware.

pub mod origin;
