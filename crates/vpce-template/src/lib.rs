//! CloudFormation synthesis for the VPCE producer stack
//!
//! Lowers a [`vpce_core::StackSpec`] into a CloudFormation template and
//! manages the output directory the template is written to.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  vpce CLI                     │
//! │          (synth / diff / validate)            │
//! └──────────────────┬───────────────────────────┘
//!                    │ StackSpec
//! ┌──────────────────▼───────────────────────────┐
//! │                vpce-template                  │
//! │  ┌──────────────┐  ┌──────────────────────┐  │
//! │  │  Synthesizer │─▶│ Template (Resources, │  │
//! │  │  (synth/*)   │  │ Outputs, intrinsics) │  │
//! │  └──────────────┘  └──────────┬───────────┘  │
//! │  ┌──────────────┐  ┌──────────▼───────────┐  │
//! │  │  Plan (diff) │  │  Assembly (files)    │  │
//! │  └──────────────┘  └──────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod assembly;
pub mod error;
pub mod intrinsic;
pub mod logical_id;
pub mod synth;
pub mod template;

// Re-exports
pub use action::{Action, ActionType, Plan, PlanSummary, plan};
pub use assembly::{Assembly, Manifest, ManifestStack};
pub use error::{Result, TemplateError};
pub use logical_id::ConstructPath;
pub use synth::{Synthesizer, synthesize};
pub use template::{Export, Output, Resource, Template};
