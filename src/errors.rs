//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`VesperError`] covers the failure modes that are
//! worth propagating: render graph wiring mistakes, graph preparation
//! failures and GPU backend errors.
//!
//! The entity database deliberately has no error channel — capacity
//! exhaustion and unknown entities are reported through sentinel values
//! (`Entity::NULL`, `None`) so that hot paths stay branch-cheap.
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, VesperError>`.

use thiserror::Error;

/// The main error type for the Vesper engine.
#[derive(Error, Debug)]
pub enum VesperError {
    // ========================================================================
    // Render Graph Errors
    // ========================================================================
    /// A node with the same name already exists in the graph.
    #[error("Render node name already taken: {0}")]
    DuplicateNodeName(String),

    /// The requested node does not exist.
    #[error("Render node not found: {0}")]
    NodeNotFound(String),

    /// The requested port does not exist on the node.
    #[error("Port not found: {node}.{port}")]
    PortNotFound {
        /// Node name
        node: String,
        /// Port name
        port: String,
    },

    /// A bindable input was connected to an output of a different type.
    #[error("Port type mismatch: {from} ({from_type}) -> {to} ({to_type})")]
    PortTypeMismatch {
        /// Producer port, `node.port` form
        from: String,
        /// Producer resource type name
        from_type: &'static str,
        /// Consumer port, `node.port` form
        to: String,
        /// Consumer resource type name
        to_type: &'static str,
    },

    /// The input already has a connection.
    #[error("Input already connected: {node}.{port}")]
    InputAlreadyConnected {
        /// Node name
        node: String,
        /// Port name
        port: String,
    },

    /// An attach port was used where a bindable port is required (or the
    /// other way around).
    #[error("Port kind mismatch: {node}.{port}")]
    PortKindMismatch {
        /// Node name
        node: String,
        /// Port name
        port: String,
    },

    /// The graph edges contain a cycle; the graph cannot be prepared.
    #[error("Render graph contains a cycle")]
    GraphCycle,

    // ========================================================================
    // GPU Backend Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),
}

/// Alias for `Result<T, VesperError>`.
pub type Result<T> = std::result::Result<T, VesperError>;
