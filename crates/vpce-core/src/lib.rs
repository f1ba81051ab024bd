//! VPCE producer stack definition
//!
//! This crate describes the producer side of a PrivateLink setup: a VPC,
//! a Fargate service fronted by two network load balancers, and a VPC
//! endpoint service exposing the internal one to other accounts.
//!
//! A [`StackSpec`] is either the built-in topology ([`StackSpec::producer`])
//! or read from a `stack.kdl` file ([`parse_kdl_file`]). Lowering it into a
//! CloudFormation template is the job of `vpce-template`; [`lint()`] reports
//! settings that would deploy badly.

pub mod discovery;
pub mod error;
pub mod lint;
pub mod model;
pub mod parser;
pub mod writer;

// Re-exports
pub use discovery::{find_project_root, load_project, stack_file_in};
pub use error::{Result, StackError};
pub use lint::{Diagnostic, Severity, lint};
pub use model::*;
pub use parser::{parse_kdl_file, parse_kdl_string};
pub use writer::to_kdl_string;
