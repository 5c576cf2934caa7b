//! Topograph Core Types and Definitions
//!
//! This crate provides the foundational types for the topograph inference
//! pipeline. It includes:
//!
//! - **Resources**: Declared-resource and relationship records produced by
//!   the upstream parser ([`resource`] module)
//! - **Reference scanning**: Depth-capped structural scanning of attribute
//!   trees for cross-resource references ([`refscan`] module)
//! - **Variable resolution**: The resolver capability used to replace
//!   interpolation markers in display names ([`resolve`] module)
//! - **Live state**: An index of provider-assigned values keyed by
//!   normalized resource address ([`state`] module)
//! - **Geometry**: The pixel rectangle shared with the renderer
//!   ([`geometry`] module)

pub mod geometry;
pub mod refscan;
pub mod resolve;
pub mod resource;
pub mod state;

pub use geometry::Position;
pub use resolve::VariableResolver;
pub use resource::{Relationship, Resource};
pub use state::StateIndex;
