//! Application Layer - Port definitions.
//!
//! The contracts the ingester and analyzer program against. Transports
//! live in the infrastructure layer and implement these ports.

/// Stream port shared by producers and consumers.
pub mod ports;
