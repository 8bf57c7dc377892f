//! Apply-Revert pipeline (C10, spec §4.10): drive the installer so the
//! environment matches the declared baseline.

use std::path::Path;

use zerb_core::{validate_tool_name, validate_version, DriftKind, DriftResult, Installer, MinimalEnv, ZerbError};

/// Outcome of reverting a single `DriftResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertAction {
    Installed { tool: String, version: String },
    Uninstalled { tool: String },
    Skipped,
}

/// Dispatch one `DriftResult` to the installer (spec §4.10 table).
/// Input validation runs before any subprocess call, regardless of what the
/// `Installer` implementation does on its own — this is the injection
/// boundary and must hold even for a hypothetical unchecked adapter.
pub fn revert_one(
    result: &DriftResult,
    installer: &dyn Installer,
    root: &Path,
    env: &MinimalEnv,
) -> Result<RevertAction, ZerbError> {
    match result.drift_kind {
        DriftKind::ExternalOverride | DriftKind::VersionMismatch | DriftKind::Missing | DriftKind::VersionUnknown => {
            let version = result.baseline_version.as_deref().ok_or_else(|| {
                ZerbError::validation("baseline_version", "revert requires a baseline version")
            })?;
            validate_tool_name(&result.tool)?;
            validate_version(version)?;
            installer.install(root, &result.tool, version, env)?;
            Ok(RevertAction::Installed { tool: result.tool.clone(), version: version.to_string() })
        }
        DriftKind::Extra => {
            validate_tool_name(&result.tool)?;
            installer.uninstall(root, &result.tool, env)?;
            Ok(RevertAction::Uninstalled { tool: result.tool.clone() })
        }
        DriftKind::ManagedButNotActive => Err(ZerbError::validation(
            "tool",
            format!("{} requires manual PATH investigation", result.tool),
        )),
        DriftKind::Ok => Ok(RevertAction::Skipped),
    }
}

/// Revert every drift result independently; one tool's failure does not
/// block the others (each carries its own outcome).
pub fn revert_all(
    results: &[DriftResult],
    installer: &dyn Installer,
    root: &Path,
    env: &MinimalEnv,
) -> Vec<(String, Result<RevertAction, ZerbError>)> {
    results
        .iter()
        .map(|d| (d.tool.clone(), revert_one(d, installer, root, env)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use zerb_core::Tool;

    #[derive(Default)]
    struct RecordingInstaller {
        installed: RefCell<Vec<(String, String)>>,
        uninstalled: RefCell<Vec<String>>,
    }

    impl Installer for RecordingInstaller {
        fn list(&self, _root: &Path, _env: &MinimalEnv) -> Result<Vec<Tool>, ZerbError> {
            Ok(vec![])
        }
        fn list_current(&self, _root: &Path, _env: &MinimalEnv) -> Result<Vec<Tool>, ZerbError> {
            Ok(vec![])
        }
        fn install(&self, _root: &Path, name: &str, version: &str, _env: &MinimalEnv) -> Result<(), ZerbError> {
            self.installed.borrow_mut().push((name.to_string(), version.to_string()));
            Ok(())
        }
        fn uninstall(&self, _root: &Path, name: &str, _env: &MinimalEnv) -> Result<(), ZerbError> {
            self.uninstalled.borrow_mut().push(name.to_string());
            Ok(())
        }
    }

    fn drift(tool: &str, kind: DriftKind, baseline_version: Option<&str>) -> DriftResult {
        DriftResult {
            tool: tool.to_string(),
            drift_kind: kind,
            baseline_version: baseline_version.map(str::to_string),
            managed_version: None,
            active_version: None,
            active_path: None,
        }
    }

    #[test]
    fn version_mismatch_installs_baseline_version() {
        let installer = RecordingInstaller::default();
        let env = MinimalEnv::default();
        let result = drift("ripgrep", DriftKind::VersionMismatch, Some("13.0.0"));
        let action = revert_one(&result, &installer, Path::new("/root"), &env).unwrap();
        assert_eq!(action, RevertAction::Installed { tool: "ripgrep".to_string(), version: "13.0.0".to_string() });
        assert_eq!(installer.installed.borrow()[0], ("ripgrep".to_string(), "13.0.0".to_string()));
    }

    #[test]
    fn extra_uninstalls_by_name() {
        let installer = RecordingInstaller::default();
        let env = MinimalEnv::default();
        let result = drift("rust", DriftKind::Extra, None);
        let action = revert_one(&result, &installer, Path::new("/root"), &env).unwrap();
        assert_eq!(action, RevertAction::Uninstalled { tool: "rust".to_string() });
        assert_eq!(installer.uninstalled.borrow()[0], "rust");
    }

    #[test]
    fn managed_but_not_active_is_rejected_without_touching_installer() {
        let installer = RecordingInstaller::default();
        let env = MinimalEnv::default();
        let result = drift("go", DriftKind::ManagedButNotActive, Some("1.22.0"));
        let err = revert_one(&result, &installer, Path::new("/root"), &env).unwrap_err();
        assert!(err.to_string().contains("manual PATH investigation"));
        assert!(installer.installed.borrow().is_empty());
        assert!(installer.uninstalled.borrow().is_empty());
    }

    #[test]
    fn ok_is_skipped() {
        let installer = RecordingInstaller::default();
        let env = MinimalEnv::default();
        let result = drift("node", DriftKind::Ok, Some("20.11.0"));
        let action = revert_one(&result, &installer, Path::new("/root"), &env).unwrap();
        assert_eq!(action, RevertAction::Skipped);
    }

    #[test]
    fn missing_baseline_version_version_unknown_reinstalls() {
        let installer = RecordingInstaller::default();
        let env = MinimalEnv::default();
        let result = drift("weird", DriftKind::VersionUnknown, Some("1.0.0"));
        let action = revert_one(&result, &installer, Path::new("/root"), &env).unwrap();
        assert_eq!(action, RevertAction::Installed { tool: "weird".to_string(), version: "1.0.0".to_string() });
    }

    // Scenario 4: an injection attempt is rejected before any subprocess call.
    #[test]
    fn injection_attempt_rejected_before_subprocess() {
        let installer = RecordingInstaller::default();
        let env = MinimalEnv::default();
        let result = drift("node; rm -rf /", DriftKind::VersionMismatch, Some("20.11.0"));
        let err = revert_one(&result, &installer, Path::new("/root"), &env).unwrap_err();
        assert!(matches!(err, ZerbError::InjectionRejected(_)));
        assert!(installer.installed.borrow().is_empty());
    }

    #[test]
    fn revert_all_continues_past_rejected_entries() {
        let installer = RecordingInstaller::default();
        let env = MinimalEnv::default();
        let results = vec![
            drift("go", DriftKind::ManagedButNotActive, Some("1.22.0")),
            drift("node", DriftKind::Missing, Some("20.11.0")),
        ];
        let outcomes = revert_all(&results, &installer, Path::new("/root"), &env);
        assert!(outcomes[0].1.is_err());
        assert!(outcomes[1].1.is_ok());
        assert_eq!(installer.installed.borrow()[0], ("node".to_string(), "20.11.0".to_string()));
    }
}
