// ABOUTME: Error types for package manager operations
// ABOUTME: Defines PackageManagerError covering lookup, phase, and constraint failures

use crate::name::PackageName;
use crate::version::{Constraint, PackageConstraint, Version};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Underlying failure wrapped by installation, uninstallation and upgrade errors
pub type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised by package manager operations.
///
/// Every variant renders to a fixed message; callers branch on [`kind`]
/// rather than on the rendered text.
///
/// [`kind`]: PackageManagerError::kind
#[derive(Error, Debug)]
pub enum PackageManagerError {
    /// Package is not in the packages database
    #[error("Package {name} is not found in packages database")]
    PackageNotFound { name: PackageName },

    /// Package is already in the packages database
    #[error("Package {name} already exists in packages database")]
    PackageAlreadyExists { name: PackageName },

    /// Installation failed for a reason outside the constraint checks
    #[error("{}", describe_cause(.cause, Phase::Installation))]
    InstallationFailed {
        #[source]
        cause: Cause,
    },

    /// Uninstallation failed
    #[error("{}", describe_cause(.cause, Phase::Uninstallation))]
    UninstallationFailed {
        #[source]
        cause: Cause,
    },

    /// Upgrade failed
    #[error("{}", describe_cause(.cause, Phase::Upgrade))]
    UpgradeFailed {
        #[source]
        cause: Cause,
    },

    /// A base OS component does not satisfy the package's requirement
    #[error(
        "Package {name} requires base OS component {component} version {constraint} {}",
        base_os_clause(.installed_version)
    )]
    SonicRequirementUnmet {
        name: PackageName,
        component: String,
        constraint: Constraint,
        installed_version: Option<Version>,
    },

    /// A required package is missing or at a non-matching version
    #[error("Package {name} requires {constraint} {}", installed_clause(.installed_version))]
    DependencyUnmet {
        name: PackageName,
        constraint: PackageConstraint,
        installed_version: Option<Version>,
    },

    /// A component of a required package is missing or at a non-matching version
    #[error(
        "Package {name} requires {component} {constraint} in package {dependency} {}",
        installed_clause(.installed_version)
    )]
    ComponentDependencyUnmet {
        name: PackageName,
        dependency: PackageName,
        component: String,
        constraint: Constraint,
        installed_version: Option<Version>,
    },

    /// An installed package matches a constraint the package conflicts with
    #[error("Package {name} conflicts with {constraint} but version {installed_version} is installed")]
    ConflictDetected {
        name: PackageName,
        constraint: PackageConstraint,
        installed_version: Version,
    },

    /// A component of an installed package matches a conflicting constraint
    #[error(
        "Package {name} conflicts with {component} {constraint} in package {dependency} \
         but version {installed_version} is installed"
    )]
    ComponentConflictDetected {
        name: PackageName,
        dependency: PackageName,
        component: String,
        constraint: Constraint,
        installed_version: Version,
    },
}

fn describe_cause(cause: &Cause, phase: Phase) -> String {
    let message = cause.to_string();
    if message.is_empty() {
        format!("package {} failed", phase.as_str())
    } else {
        message
    }
}

// "int" is the wording downstream tooling already matches on.
fn base_os_clause(installed_version: &Option<Version>) -> String {
    match installed_version {
        Some(version) => format!("while the installed version is {version}"),
        None => "but it is not present int base OS image".to_string(),
    }
}

fn installed_clause(installed_version: &Option<Version>) -> String {
    match installed_version {
        Some(version) => format!("but version {version} is installed"),
        None => "but it is not installed".to_string(),
    }
}

impl PackageManagerError {
    /// Package is not in the packages database
    pub fn not_found(name: impl Into<PackageName>) -> Self {
        Self::PackageNotFound { name: name.into() }
    }

    /// Package is already in the packages database
    pub fn already_exists(name: impl Into<PackageName>) -> Self {
        Self::PackageAlreadyExists { name: name.into() }
    }

    /// Wrap an installation failure
    pub fn installation_failed(cause: impl Into<Cause>) -> Self {
        Self::InstallationFailed {
            cause: cause.into(),
        }
    }

    /// Wrap an uninstallation failure
    pub fn uninstallation_failed(cause: impl Into<Cause>) -> Self {
        Self::UninstallationFailed {
            cause: cause.into(),
        }
    }

    /// Wrap an upgrade failure
    pub fn upgrade_failed(cause: impl Into<Cause>) -> Self {
        Self::UpgradeFailed {
            cause: cause.into(),
        }
    }

    /// Base OS `component` is absent (`None`) or does not satisfy `constraint`
    pub fn sonic_requirement_unmet(
        name: impl Into<PackageName>,
        component: impl Into<String>,
        constraint: Constraint,
        installed_version: Option<Version>,
    ) -> Self {
        Self::SonicRequirementUnmet {
            name: name.into(),
            component: component.into(),
            constraint,
            installed_version,
        }
    }

    /// Required package is absent (`None`) or does not satisfy `constraint`
    pub fn dependency_unmet(
        name: impl Into<PackageName>,
        constraint: impl Into<PackageConstraint>,
        installed_version: Option<Version>,
    ) -> Self {
        Self::DependencyUnmet {
            name: name.into(),
            constraint: constraint.into(),
            installed_version,
        }
    }

    /// `component` of `dependency` is absent (`None`) or does not satisfy `constraint`
    pub fn component_dependency_unmet(
        name: impl Into<PackageName>,
        dependency: impl Into<PackageName>,
        component: impl Into<String>,
        constraint: Constraint,
        installed_version: Option<Version>,
    ) -> Self {
        Self::ComponentDependencyUnmet {
            name: name.into(),
            dependency: dependency.into(),
            component: component.into(),
            constraint,
            installed_version,
        }
    }

    /// Installed version matches a constraint `name` conflicts with
    pub fn conflict_detected(
        name: impl Into<PackageName>,
        constraint: impl Into<PackageConstraint>,
        installed_version: Version,
    ) -> Self {
        Self::ConflictDetected {
            name: name.into(),
            constraint: constraint.into(),
            installed_version,
        }
    }

    /// Installed `component` of `dependency` matches a constraint `name` conflicts with
    pub fn component_conflict_detected(
        name: impl Into<PackageName>,
        dependency: impl Into<PackageName>,
        component: impl Into<String>,
        constraint: Constraint,
        installed_version: Version,
    ) -> Self {
        Self::ComponentConflictDetected {
            name: name.into(),
            dependency: dependency.into(),
            component: component.into(),
            constraint,
            installed_version,
        }
    }

    /// Discriminant for branching without parsing the message
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PackageNotFound { .. } => ErrorKind::PackageNotFound,
            Self::PackageAlreadyExists { .. } => ErrorKind::PackageAlreadyExists,
            Self::InstallationFailed { .. } => ErrorKind::InstallationFailed,
            Self::UninstallationFailed { .. } => ErrorKind::UninstallationFailed,
            Self::UpgradeFailed { .. } => ErrorKind::UpgradeFailed,
            Self::SonicRequirementUnmet { .. } => ErrorKind::SonicRequirementUnmet,
            Self::DependencyUnmet { .. } => ErrorKind::DependencyUnmet,
            Self::ComponentDependencyUnmet { .. } => ErrorKind::ComponentDependencyUnmet,
            Self::ConflictDetected { .. } => ErrorKind::ConflictDetected,
            Self::ComponentConflictDetected { .. } => ErrorKind::ComponentConflictDetected,
        }
    }

    /// Human-readable message, identical to the `Display` output
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Wrapped failure of an installation, uninstallation or upgrade
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::InstallationFailed { cause }
            | Self::UninstallationFailed { cause }
            | Self::UpgradeFailed { cause } => Some(cause.as_ref()),
            _ => None,
        }
    }

    /// Package the error was raised for
    pub fn package(&self) -> Option<&PackageName> {
        match self {
            Self::PackageNotFound { name }
            | Self::PackageAlreadyExists { name }
            | Self::SonicRequirementUnmet { name, .. }
            | Self::DependencyUnmet { name, .. }
            | Self::ComponentDependencyUnmet { name, .. }
            | Self::ConflictDetected { name, .. }
            | Self::ComponentConflictDetected { name, .. } => Some(name),
            Self::InstallationFailed { .. }
            | Self::UninstallationFailed { .. }
            | Self::UpgradeFailed { .. } => None,
        }
    }

    /// Package that is required or conflicted with, or that owns the offending component
    pub fn dependency(&self) -> Option<&PackageName> {
        match self {
            Self::ComponentDependencyUnmet { dependency, .. }
            | Self::ComponentConflictDetected { dependency, .. } => Some(dependency),
            Self::DependencyUnmet { constraint, .. } | Self::ConflictDetected { constraint, .. } => {
                constraint.package()
            }
            _ => None,
        }
    }

    /// Base OS or package component the constraint applies to
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::SonicRequirementUnmet { component, .. }
            | Self::ComponentDependencyUnmet { component, .. }
            | Self::ComponentConflictDetected { component, .. } => Some(component.as_str()),
            _ => None,
        }
    }

    /// Constraint that was violated or conflicted with
    pub fn constraint(&self) -> Option<&Constraint> {
        match self {
            Self::SonicRequirementUnmet { constraint, .. }
            | Self::ComponentDependencyUnmet { constraint, .. }
            | Self::ComponentConflictDetected { constraint, .. } => Some(constraint),
            Self::DependencyUnmet { constraint, .. } | Self::ConflictDetected { constraint, .. } => {
                Some(constraint.constraint())
            }
            _ => None,
        }
    }

    /// Installed version involved, `None` when nothing is installed
    pub fn installed_version(&self) -> Option<&Version> {
        match self {
            Self::SonicRequirementUnmet {
                installed_version, ..
            }
            | Self::DependencyUnmet {
                installed_version, ..
            }
            | Self::ComponentDependencyUnmet {
                installed_version, ..
            } => installed_version.as_ref(),
            Self::ConflictDetected {
                installed_version, ..
            }
            | Self::ComponentConflictDetected {
                installed_version, ..
            } => Some(installed_version),
            _ => None,
        }
    }

    /// Whether the error belongs to the installation phase
    pub fn is_installation_error(&self) -> bool {
        self.kind().phase() == Phase::Installation
    }
}

/// Discriminant of [`PackageManagerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// [`PackageManagerError::PackageNotFound`]
    PackageNotFound,
    /// [`PackageManagerError::PackageAlreadyExists`]
    PackageAlreadyExists,
    /// [`PackageManagerError::InstallationFailed`]
    InstallationFailed,
    /// [`PackageManagerError::UninstallationFailed`]
    UninstallationFailed,
    /// [`PackageManagerError::UpgradeFailed`]
    UpgradeFailed,
    /// [`PackageManagerError::SonicRequirementUnmet`]
    SonicRequirementUnmet,
    /// [`PackageManagerError::DependencyUnmet`]
    DependencyUnmet,
    /// [`PackageManagerError::ComponentDependencyUnmet`]
    ComponentDependencyUnmet,
    /// [`PackageManagerError::ConflictDetected`]
    ConflictDetected,
    /// [`PackageManagerError::ComponentConflictDetected`]
    ComponentConflictDetected,
}

impl ErrorKind {
    /// Every kind, in declaration order
    pub const ALL: [ErrorKind; 10] = [
        Self::PackageNotFound,
        Self::PackageAlreadyExists,
        Self::InstallationFailed,
        Self::UninstallationFailed,
        Self::UpgradeFailed,
        Self::SonicRequirementUnmet,
        Self::DependencyUnmet,
        Self::ComponentDependencyUnmet,
        Self::ConflictDetected,
        Self::ComponentConflictDetected,
    ];

    /// Stable snake_case identifier
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PackageNotFound => "package_not_found",
            Self::PackageAlreadyExists => "package_already_exists",
            Self::InstallationFailed => "installation_failed",
            Self::UninstallationFailed => "uninstallation_failed",
            Self::UpgradeFailed => "upgrade_failed",
            Self::SonicRequirementUnmet => "sonic_requirement_unmet",
            Self::DependencyUnmet => "dependency_unmet",
            Self::ComponentDependencyUnmet => "component_dependency_unmet",
            Self::ConflictDetected => "conflict_detected",
            Self::ComponentConflictDetected => "component_conflict_detected",
        }
    }

    /// Broad grouping used to decide between retrying and reporting
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::PackageNotFound | Self::PackageAlreadyExists => ErrorCategory::Lookup,
            Self::InstallationFailed | Self::UninstallationFailed | Self::UpgradeFailed => {
                ErrorCategory::PhaseFailure
            }
            Self::SonicRequirementUnmet
            | Self::DependencyUnmet
            | Self::ComponentDependencyUnmet
            | Self::ConflictDetected
            | Self::ComponentConflictDetected => ErrorCategory::ConstraintViolation,
        }
    }

    /// Operation phase; constraint violations are installation failures
    pub fn phase(self) -> Phase {
        match self {
            Self::PackageNotFound | Self::PackageAlreadyExists => Phase::Lookup,
            Self::UninstallationFailed => Phase::Uninstallation,
            Self::UpgradeFailed => Phase::Upgrade,
            Self::InstallationFailed
            | Self::SonicRequirementUnmet
            | Self::DependencyUnmet
            | Self::ComponentDependencyUnmet
            | Self::ConflictDetected
            | Self::ComponentConflictDetected => Phase::Installation,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad grouping of error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Not-found and already-exists
    Lookup,
    /// Opaque failure wrapping an underlying cause
    PhaseFailure,
    /// Requirement unmet or conflict detected
    ConstraintViolation,
}

/// Package manager operation an error was raised from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Looking a package up in the packages database
    Lookup,
    /// Installing a package, including constraint checks
    Installation,
    /// Removing an installed package
    Uninstallation,
    /// Replacing an installed package with another version
    Upgrade,
}

impl Phase {
    /// Lowercase name used in messages and log fields
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Installation => "installation",
            Self::Uninstallation => "uninstallation",
            Self::Upgrade => "upgrade",
        }
    }
}

/// Manifest failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ManifestError(pub String);

/// Package metadata could not be read or is malformed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct MetadataError(pub String);
