#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Capability-aware conversion of an EDM model into REST paths and
//! operations.
//!
//! A run enumerates every addressable path of the model
//! ([`PathTreeBuilder`]), resolves the `Org.OData.Capabilities.V1`
//! restrictions governing each path ([`RestrictionResolver`], memoized by an
//! [`AnnotationCache`]) and decides which HTTP operations exist and how their
//! parameters look ([`OperationSynthesizer`]). [`document::build_openapi`]
//! turns the result into a `utoipa` `OpenAPI` document.
//!
//! ```ignore
//! let model = edm_model::EdmModel::from_json_str(&text)?;
//! let conversion = edm_openapi::convert(&model, &ConvertSettings::default())?;
//! let doc = edm_openapi::document::build_openapi(&model, &conversion, &DocumentInfo::default());
//! ```

pub mod cache;
pub mod capabilities;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod paths;
pub mod resolver;
pub mod synth;

pub use cache::AnnotationCache;
pub use config::ConvertSettings;
pub use convert::{Conversion, Converter, convert};
pub use document::{DocumentInfo, EdmSchemaProvider, SchemaProvider, build_openapi};
pub use error::{ConfigError, ConvertError};
pub use paths::{ODataPath, PathKind, PathSegment, PathTreeBuilder};
pub use resolver::{Resolved, RestrictionResolver};
pub use synth::{OperationDescriptor, OperationSynthesizer};
