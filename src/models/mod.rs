//! Data models for the Redshift dialect adapter.
//!
//! This module re-exports all model types used throughout the crate.

pub mod connection;
pub mod schema;

// Re-export commonly used types
pub use connection::{
    ConnectionConfig, ConnectionDescriptor, ConnectionField, DEFAULT_REDSHIFT_PORT,
    DEFAULT_TUNNEL_PORT, FieldType, TunnelAuth, TunnelConfig,
};
pub use schema::{FieldDefinition, ForeignKeyEdge, TableForeignKeys, TableRef};
