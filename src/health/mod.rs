//! Startup diagnostics: health check, environment verification and
//! `.env.example` generation.

pub mod env_example;

pub use env_example::sanitize_env_example;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{keys, Settings, DEFAULT_UPLOAD_FOLDER};

pub const TEMP_DIR: &str = "temp";
pub const ENV_FILE: &str = ".env";

const SECRET_MARKERS: [&str; 3] = ["KEY", "SECRET", "TOKEN"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub checks: Vec<CheckResult>,
}

impl Report {
    fn push(&mut self, status: CheckStatus, message: impl Into<String>) {
        self.checks.push(CheckResult::new(status, message));
    }

    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() { 0 } else { 1 }
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Fail)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            let mark = match check.status {
                CheckStatus::Pass => "✓",
                CheckStatus::Warn => "⚠",
                CheckStatus::Fail => "✗",
            };
            writeln!(f, "{} {}", mark, check.message)?;
        }
        if self.passed() {
            write!(f, "✅ All checks passed")
        } else {
            write!(f, "❌ Some checks failed")
        }
    }
}

fn resolve(workdir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workdir.join(path)
    }
}

/// Critical files, directories and the credential. Exit code 1 if any is missing.
pub fn health_check(settings: &Settings, workdir: &Path) -> Report {
    let mut report = Report::default();

    if !workdir.join(ENV_FILE).exists() {
        report.push(CheckStatus::Fail, format!("Critical file missing: {}", ENV_FILE));
    }
    for dir in [settings.upload_folder.as_path(), Path::new(TEMP_DIR)] {
        if !resolve(workdir, dir).is_dir() {
            report.push(CheckStatus::Fail, format!("Critical directory missing: {}", dir.display()));
        }
    }
    if settings.has_credential() {
        report.push(CheckStatus::Pass, format!("{} configured", keys::API_KEY));
    } else {
        report.push(CheckStatus::Fail, format!("{} not configured", keys::API_KEY));
    }
    report
}

fn is_secret(key: &str) -> bool {
    SECRET_MARKERS.iter().any(|marker| key.contains(marker))
}

fn check_variable<F>(report: &mut Report, lookup: &F, key: &str, required: bool)
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(_) if is_secret(key) => report.push(CheckStatus::Pass, format!("{} is set", key)),
        Some(value) => report.push(CheckStatus::Pass, format!("{}={}", key, value)),
        None if required => report.push(CheckStatus::Fail, format!("{} is NOT set (required)", key)),
        None => report.push(CheckStatus::Warn, format!("{} is NOT set (optional)", key)),
    }
}

/// Reports every known variable without revealing secrets. Only a missing credential
/// or a missing `.env` fails.
pub fn verify_env<F>(lookup: F, workdir: &Path) -> Report
where
    F: Fn(&str) -> Option<String>,
{
    let mut report = Report::default();

    check_variable(&mut report, &lookup, keys::API_KEY, true);
    for key in [
        keys::BASE_URL,
        keys::MODEL,
        keys::UPLOAD_FOLDER,
        keys::MAX_FILE_SIZE,
        keys::DEFAULT_LANGUAGE,
    ] {
        check_variable(&mut report, &lookup, key, false);
    }

    let upload_folder = lookup(keys::UPLOAD_FOLDER)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_UPLOAD_FOLDER.to_string());
    for dir in [upload_folder.as_str(), TEMP_DIR] {
        if resolve(workdir, Path::new(dir)).is_dir() {
            report.push(CheckStatus::Pass, format!("Directory {} exists", dir));
        } else {
            report.push(CheckStatus::Warn, format!("Directory {} does NOT exist", dir));
        }
    }

    if workdir.join(ENV_FILE).exists() {
        report.push(CheckStatus::Pass, format!("File {} exists", ENV_FILE));
    } else {
        report.push(CheckStatus::Fail, format!("File {} does NOT exist", ENV_FILE));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn healthy_workdir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(".env"), "OPENAI_API_KEY=sk-test\n").unwrap();
        std::fs::create_dir(tmp.path().join("uploads")).unwrap();
        std::fs::create_dir(tmp.path().join("temp")).unwrap();
        tmp
    }

    #[test]
    fn test_health_check_passes() {
        let tmp = healthy_workdir();
        let settings = Settings::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")]));
        let report = health_check(&settings, tmp.path());
        assert!(report.passed(), "{}", report);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_health_check_reports_each_failure() {
        let tmp = TempDir::new().unwrap();
        let report = health_check(&Settings::default(), tmp.path());
        assert_eq!(report.exit_code(), 1);

        let failures: Vec<_> = report.failures().map(|c| c.message.as_str()).collect();
        assert_eq!(
            failures,
            vec![
                "Critical file missing: .env",
                "Critical directory missing: uploads",
                "Critical directory missing: temp",
                "OPENAI_API_KEY not configured",
            ]
        );
    }

    #[test]
    fn test_verify_env_hides_secret_values() {
        let tmp = healthy_workdir();
        let report = verify_env(
            lookup_from(&[("OPENAI_API_KEY", "sk-very-secret"), ("DEFAULT_LANGUAGE", "Spanish")]),
            tmp.path(),
        );
        let rendered = report.to_string();
        assert!(report.passed());
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("✓ OPENAI_API_KEY is set"));
        assert!(rendered.contains("✓ DEFAULT_LANGUAGE=Spanish"));
        assert!(rendered.contains("⚠ MAX_FILE_SIZE is NOT set (optional)"));
    }

    #[test]
    fn test_verify_env_optional_gaps_do_not_fail() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(".env"), "").unwrap();
        let report = verify_env(lookup_from(&[("OPENAI_API_KEY", "sk")]), tmp.path());
        assert!(report.passed());
        assert!(report.to_string().contains("Directory temp does NOT exist"));

        let report = verify_env(lookup_from(&[]), tmp.path());
        assert!(!report.passed());
        assert!(report.to_string().ends_with("❌ Some checks failed"));
    }
}
