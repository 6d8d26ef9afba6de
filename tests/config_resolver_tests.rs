use concierge::config::{
    ConfigResolver, ConfigSource, CoordinatorConfig, ExplicitPath, PackageRelative,
    SpecialistTransport, TopLevel,
};
use concierge::dispatch::ResponseStatus;
use concierge::error::ConfigError;
use std::path::Path;
use tempfile::TempDir;

// ─── Helper ───────────────────────────────────────────────────────────

fn write_config(dir: &Path, name: &str) -> std::path::PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("coordinator_config.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[coordinator]
name = "{name}"
default_specialist = "general"
specialist_timeout_secs = 7
degraded_status = "error"

[coordinator.specialists.payroll]
description = "Answers salary questions"
keywords = ["salary", "payslip"]
command = "./payroll.sh"

[coordinator.specialists.general]
endpoint = "http://127.0.0.1:9000/ask"
"#
        ),
    )
    .unwrap();
    path
}

/// A source that always fails, standing in for a broken strategy.
struct Broken;

impl ConfigSource for Broken {
    fn describe(&self) -> String {
        "broken".to_string()
    }

    fn load(&self) -> Result<CoordinatorConfig, ConfigError> {
        Err(ConfigError::ParseError {
            path: "broken.toml".into(),
            message: "injected failure".to_string(),
        })
    }
}

fn assert_expected_attributes(config: &CoordinatorConfig, name: &str) {
    assert_eq!(config.name, name);
    assert_eq!(config.default_specialist.as_deref(), Some("general"));
    assert_eq!(config.specialist_timeout_secs, 7);
    assert_eq!(config.degraded_status, ResponseStatus::Error);
    assert_eq!(config.specialists.len(), 2);

    let payroll = config.specialist("payroll").expect("payroll specialist");
    assert_eq!(payroll.keywords, vec!["salary", "payslip"]);
    assert_eq!(payroll.description.as_deref(), Some("Answers salary questions"));
    assert_eq!(
        payroll.transport,
        SpecialistTransport::Command("./payroll.sh".to_string())
    );
    assert_eq!(
        config.specialist("general").unwrap().transport,
        SpecialistTransport::Http("http://127.0.0.1:9000/ask".to_string())
    );
}

// ============================================================
// Strategy order
// ============================================================

#[test]
fn test_package_relative_wins_first() {
    let tmp = TempDir::new().unwrap();
    let package = tmp.path().join("bin");
    let top = tmp.path().join("cwd");
    write_config(&package, "from-package");
    write_config(&top, "from-top-level");
    write_config(&package.join("config"), "from-file-path");

    let config = ConfigResolver::standard(package, top, None).resolve().unwrap();
    assert_eq!(config.name, "from-package");
}

#[test]
fn test_top_level_used_when_package_relative_missing() {
    let tmp = TempDir::new().unwrap();
    let package = tmp.path().join("bin");
    let top = tmp.path().join("cwd");
    std::fs::create_dir_all(&package).unwrap();
    write_config(&top, "from-top-level");
    write_config(&package.join("config"), "from-file-path");

    let config = ConfigResolver::standard(package, top, None).resolve().unwrap();
    assert_eq!(config.name, "from-top-level");
}

// ============================================================
// File-path fallback must complete fully
// ============================================================

#[test]
fn test_file_path_fallback_returns_complete_config() {
    let tmp = TempDir::new().unwrap();
    let package = tmp.path().join("bin");
    let top = tmp.path().join("cwd");
    std::fs::create_dir_all(&package).unwrap();
    std::fs::create_dir_all(&top).unwrap();
    let expected_path = write_config(&package.join("config"), "from-file-path");

    let config = ConfigResolver::standard(package, top, None)
        .resolve()
        .expect("file-path fallback should load the config");

    assert_expected_attributes(&config, "from-file-path");
    assert_eq!(config.source, expected_path);
}

#[test]
fn test_file_path_fallback_after_injected_failures() {
    let tmp = TempDir::new().unwrap();
    let path = write_config(&tmp.path().join("elsewhere"), "explicit");

    let resolver = ConfigResolver::new(vec![
        Box::new(Broken),
        Box::new(Broken),
        Box::new(ExplicitPath { path: path.clone() }),
    ]);
    let config = resolver.resolve().expect("third strategy should succeed");

    assert_expected_attributes(&config, "explicit");
    assert_eq!(config.source, path);
}

#[test]
fn test_explicit_path_replaces_computed_path() {
    let tmp = TempDir::new().unwrap();
    let package = tmp.path().join("bin");
    std::fs::create_dir_all(&package).unwrap();
    write_config(&package.join("config"), "computed");
    let explicit = write_config(&tmp.path().join("ops"), "explicit");

    let config = ConfigResolver::standard(package, tmp.path().join("cwd"), Some(explicit))
        .resolve()
        .unwrap();
    assert_eq!(config.name, "explicit");
}

#[test]
fn test_explicit_path_wins_over_stale_search_copies() {
    let tmp = TempDir::new().unwrap();
    let package = tmp.path().join("bin");
    let cwd = tmp.path().join("cwd");
    write_config(&package, "stale-package-copy");
    write_config(&cwd, "stale-working-copy");
    let explicit = write_config(&tmp.path().join("ops"), "operator-chosen");

    let config = ConfigResolver::standard(package, cwd, Some(explicit.clone()))
        .resolve()
        .unwrap();
    assert_eq!(config.name, "operator-chosen");
    assert_eq!(config.source, explicit);
}

#[test]
fn test_missing_explicit_path_does_not_fall_back_to_search() {
    let tmp = TempDir::new().unwrap();
    let package = tmp.path().join("bin");
    write_config(&package, "stale-package-copy");

    let resolver = ConfigResolver::standard(
        package,
        tmp.path().join("cwd"),
        Some(tmp.path().join("ops/missing.toml")),
    );

    match resolver.resolve() {
        Err(ConfigError::NotFound { attempts }) => {
            assert_eq!(attempts.len(), 1);
            assert!(attempts[0].contains("missing.toml"), "attempts: {attempts:?}");
        }
        other => panic!("Expected NotFound, got: {other:?}"),
    }
}

// ============================================================
// Failures
// ============================================================

#[test]
fn test_all_strategies_failing_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let resolver = ConfigResolver::standard(
        tmp.path().join("bin"),
        tmp.path().join("cwd"),
        None,
    );

    match resolver.resolve() {
        Err(ConfigError::NotFound { attempts }) => {
            assert_eq!(attempts.len(), 3);
            assert!(attempts[0].starts_with("package-relative"));
            assert!(attempts[1].starts_with("top-level"));
            assert!(attempts[2].starts_with("file path"));
        }
        other => panic!("Expected NotFound, got: {other:?}"),
    }
}

#[test]
fn test_malformed_unit_falls_through_to_next_strategy() {
    let tmp = TempDir::new().unwrap();
    let package = tmp.path().join("bin");
    std::fs::create_dir_all(&package).unwrap();
    std::fs::write(package.join("coordinator_config.toml"), "[coordinator\n").unwrap();
    write_config(&tmp.path().join("cwd"), "from-top-level");

    let config = ConfigResolver::standard(package, tmp.path().join("cwd"), None)
        .resolve()
        .unwrap();
    assert_eq!(config.name, "from-top-level");
}

#[test]
fn test_unit_without_specialists_is_rejected() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("coordinator_config.toml"),
        "[coordinator]\nname = \"empty\"\n",
    )
    .unwrap();

    let err = PackageRelative {
        package_dir: tmp.path().to_path_buf(),
    }
    .load()
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}

#[test]
fn test_top_level_reads_logical_name() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path(), "named");

    let source = TopLevel {
        root: tmp.path().to_path_buf(),
    };
    assert!(source.describe().contains("coordinator_config.toml"));
    assert_eq!(source.load().unwrap().name, "named");
}
