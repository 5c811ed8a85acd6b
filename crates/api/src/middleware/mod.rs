//! Request middleware.

pub mod internal;
