// ABOUTME: Structured error reports handed to CLI and API boundaries
// ABOUTME: Serializes errors to JSON and logs them through tracing

use crate::error::{ErrorCategory, ErrorKind, PackageManagerError, Phase};
use crate::name::PackageName;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;

/// Snapshot of a [`PackageManagerError`] for display, logging or JSON output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    /// Variant tag
    pub kind: ErrorKind,
    /// Lookup, phase failure or constraint violation
    pub category: ErrorCategory,
    /// Operation the error was raised from
    pub phase: Phase,
    /// Rendered message
    pub message: String,
    /// Package the error was raised for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageName>,
    /// Installed version involved in the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<Version>,
    /// Messages of the source chain, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorReport {
    /// Build a report from an error
    pub fn new(err: &PackageManagerError) -> Self {
        let kind = err.kind();

        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            kind,
            category: kind.category(),
            phase: kind.phase(),
            message: err.render(),
            package: err.package().cloned(),
            installed_version: err.installed_version().cloned(),
            causes,
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Log the report at error level
    pub fn emit(&self) {
        tracing::error!(
            kind = %self.kind,
            phase = self.phase.as_str(),
            package = self.package.as_ref().map(PackageName::as_str),
            installed_version = self.installed_version.as_ref().map(Version::as_str),
            causes = self.causes.len(),
            "{}",
            self.message
        );
    }
}

impl From<&PackageManagerError> for ErrorReport {
    fn from(err: &PackageManagerError) -> Self {
        Self::new(err)
    }
}

impl PackageManagerError {
    /// Structured snapshot of this error
    pub fn report(&self) -> ErrorReport {
        ErrorReport::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Constraint;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn dependency_error() -> PackageManagerError {
        PackageManagerError::dependency_unmet(
            "swss",
            Constraint::parse(">=2.0").unwrap(),
            Some(Version::parse("1.5").unwrap()),
        )
    }

    #[test]
    fn test_report_fields() {
        let report = dependency_error().report();
        assert_eq!(report.kind, ErrorKind::DependencyUnmet);
        assert_eq!(report.category, ErrorCategory::ConstraintViolation);
        assert_eq!(report.phase, Phase::Installation);
        assert_eq!(report.message, "Package swss requires >=2.0 but version 1.5 is installed");
        assert_eq!(report.package.as_ref().unwrap(), "swss");
        assert_eq!(report.installed_version.as_ref().unwrap().as_str(), "1.5");
        assert!(report.causes.is_empty());
    }

    #[test]
    fn test_report_json_shape() {
        let report = dependency_error().report();
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["kind"], "dependency_unmet");
        assert_eq!(value["category"], "constraint_violation");
        assert_eq!(value["phase"], "installation");
        assert_eq!(value["package"], "swss");
        assert_eq!(value["installedVersion"], "1.5");
        assert!(value.get("causes").is_none());

        let back: ErrorReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_report_collects_cause_chain() {
        let err = PackageManagerError::installation_failed(io::Error::new(
            io::ErrorKind::Other,
            "failed to pull image",
        ));
        let report = ErrorReport::from(&err);

        assert_eq!(report.kind, ErrorKind::InstallationFailed);
        assert_eq!(report.message, "failed to pull image");
        assert_eq!(report.causes, vec!["failed to pull image".to_string()]);
        assert!(report.package.is_none());

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value.get("package").is_none());
        assert_eq!(value["causes"][0], "failed to pull image");
    }

    #[test]
    fn test_emit_logs_structured_fields() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || dependency_error().report().emit());

        let logged = captured.contents();
        assert!(logged.contains("ERROR"));
        assert!(logged.contains("Package swss requires >=2.0 but version 1.5 is installed"));
        assert!(logged.contains("kind=dependency_unmet"));
        assert!(logged.contains("installed_version=\"1.5\"") || logged.contains("installed_version=1.5"));
    }
}
