//! Stack definition model
//!
//! Every type here is a descriptor of something CloudFormation will create.
//! Nothing is mutated after the definition is built.

mod cidr;
mod exposure;
mod network;
mod service;
mod stack;

// Re-exports
pub use cidr::*;
pub use exposure::*;
pub use network::*;
pub use service::*;
pub use stack::*;
