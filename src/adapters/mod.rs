//! External system integrations for claimsync.
//!
//! This module provides adapters for the systems the pipeline talks to:
//!
//! - [`store`] - Document store abstraction (PostgreSQL JSONB, in-memory)
//! - [`inference`] - Chat-completions inference service client
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external
//! dependencies and enable testing with in-process implementations. The
//! store layer uses trait-based abstraction so the pipeline never sees
//! a concrete backend.

pub mod inference;
pub mod store;
