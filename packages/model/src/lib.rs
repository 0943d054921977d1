//! # Animgraph Model
//!
//! Immutable building blocks of an animation node-graph document.
//!
//! ```text
//! Registry ──▶ Node ──▶ Property (keyframed PropertyValue timeline)
//!                 └───▶ ConnectorMetadata (shared + local)
//! Connection: (output node, output connector) → (input node, input connector)
//! ```
//!
//! Everything here is immutable once built. Edits go through builders
//! ([`NodeBuilder`], [`PropertyBuilder`]) that return new instances and
//! share whatever they did not touch.

pub mod connection;
pub mod error;
pub mod id;
pub mod node;
pub mod property;
pub mod registry;
pub mod value;

pub use connection::Connection;
pub use error::{ModelError, ModelResult};
pub use id::{ContentHash, NodeId};
pub use node::{ConnectorList, Node, NodeBuilder};
pub use property::{Frame, Keyframe, Property, PropertyBuilder};
pub use registry::{
    ConnectorMetadata, ConnectorRole, NodeTypeBuilder, NodeTypeMetadata, PropertyMetadata,
    Registry, RegistryBuilder, TITLE_PROPERTY,
};
pub use value::{PropertyValue, ValueType, Vec2, Vec3};
