//! Dependency resolution engine: version range parsing and intersection,
//! greedy highest-version constraint propagation over a worklist, and the
//! version-source seam the resolver fetches through.
//!
//! The resolver performs no I/O of its own. Everything it knows about the
//! outside world comes through [`source::VersionSource`].

pub mod cache;
pub mod conflict;
pub mod graph;
pub mod package;
pub mod resolver;
pub mod source;
pub mod version;

pub use package::{InvalidPackageId, PackageId};
pub use resolver::{resolve, Resolution, ResolutionResult, ResolveOptions};
pub use version::Constraint;
