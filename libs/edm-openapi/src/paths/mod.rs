//! Addressable resource paths and their enumeration.

mod builder;
mod path;
mod segment;

pub use builder::PathTreeBuilder;
pub use path::{ODataPath, ParameterSource, PathKind, PathParameter};
pub use segment::PathSegment;
