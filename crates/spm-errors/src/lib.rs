// ABOUTME: Error taxonomy for the package manager: lookup, phase, and constraint failures
// ABOUTME: Includes package names, version/constraint values, and boundary error reports

pub mod error;
pub mod name;
pub mod report;
pub mod version;

pub use error::{
    Cause, ErrorCategory, ErrorKind, ManifestError, MetadataError, PackageManagerError, Phase,
};
pub use name::PackageName;
pub use report::ErrorReport;
pub use version::{Constraint, PackageConstraint, Version, VersionError};

/// Result type alias using [`PackageManagerError`]
pub type Result<T> = std::result::Result<T, PackageManagerError>;
