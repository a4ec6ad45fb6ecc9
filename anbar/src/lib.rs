//! # Anbar — a lazy, configuration-driven IoC container
//!
//! Describe an application's classes once in a catalog, declare services
//! and recipes on a container, and let object graphs build themselves
//! lazily: shared services are constructed on first request and memoized,
//! typed constructor parameters are auto-wired, and everything else stays
//! a deferred value until forced.

pub use anbar_container::*;
pub use anbar_support::*;
