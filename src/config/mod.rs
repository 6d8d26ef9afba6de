pub mod merge;
pub mod schema;

pub use schema::*;

use crate::cli::ConfigArgs;
use crate::error::ConfigError;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Logical name of the configuration unit (`coordinator_config.toml`).
pub const CONFIG_UNIT: &str = "coordinator_config";

/// Name of the table inside the unit that holds the configuration.
pub const CONFIG_SYMBOL: &str = "coordinator";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CONCIERGE_CONFIG";

/// One way of locating and loading the coordinator configuration.
///
/// A source either returns a fully built [`CoordinatorConfig`] or an error;
/// it never hands back a partially loaded value.
pub trait ConfigSource: Send + Sync {
    /// Short human-readable description used in logs and `NotFound` errors.
    fn describe(&self) -> String;

    fn load(&self) -> Result<CoordinatorConfig, ConfigError>;
}

/// The configuration unit living next to the coordinator executable.
pub struct PackageRelative {
    pub package_dir: PathBuf,
}

impl ConfigSource for PackageRelative {
    fn describe(&self) -> String {
        format!("package-relative ({})", unit_path(&self.package_dir).display())
    }

    fn load(&self) -> Result<CoordinatorConfig, ConfigError> {
        load_unit(&unit_path(&self.package_dir))
    }
}

/// The configuration unit resolved by name from the top-level root (the
/// working directory when the coordinator is run standalone).
pub struct TopLevel {
    pub root: PathBuf,
}

impl ConfigSource for TopLevel {
    fn describe(&self) -> String {
        format!("top-level ({})", unit_path(&self.root).display())
    }

    fn load(&self) -> Result<CoordinatorConfig, ConfigError> {
        load_unit(&unit_path(&self.root))
    }
}

/// An explicit file path, either given by the operator or computed from the
/// coordinator's own location (`<package_dir>/config/coordinator_config.toml`).
pub struct ExplicitPath {
    pub path: PathBuf,
}

impl ExplicitPath {
    pub fn beside(package_dir: &Path) -> Self {
        Self {
            path: package_dir
                .join("config")
                .join(format!("{CONFIG_UNIT}.toml")),
        }
    }
}

impl ConfigSource for ExplicitPath {
    fn describe(&self) -> String {
        format!("file path ({})", self.path.display())
    }

    fn load(&self) -> Result<CoordinatorConfig, ConfigError> {
        // All three steps must succeed before anything is returned.
        let contents = read_unit(&self.path)?;
        let table = parse_unit(&self.path, &contents)?;
        let config = extract_config(&self.path, table)?;
        Ok(config)
    }
}

/// Ordered list of config sources, tried in sequence until one succeeds.
pub struct ConfigResolver {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigResolver {
    pub fn new(sources: Vec<Box<dyn ConfigSource>>) -> Self {
        Self { sources }
    }

    /// The standard three-step chain: package-relative, top-level, file path.
    /// An explicit path overrides the default search and is the only source
    /// tried.
    pub fn standard(package_dir: PathBuf, top_level: PathBuf, explicit: Option<PathBuf>) -> Self {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "Explicit config path given, skipping search");
            return Self::new(vec![Box::new(ExplicitPath { path })]);
        }
        Self::new(vec![
            Box::new(PackageRelative {
                package_dir: package_dir.clone(),
            }),
            Box::new(TopLevel { root: top_level }),
            Box::new(ExplicitPath::beside(&package_dir)),
        ])
    }

    /// Build the standard chain for the running process: the executable's
    /// directory and the current working directory.
    pub fn for_current_process(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate the coordinator executable")?;
        let package_dir = exe
            .parent()
            .map(Path::to_path_buf)
            .context("Coordinator executable has no parent directory")?;
        let top_level = std::env::current_dir().context("Failed to read the working directory")?;
        Ok(Self::standard(package_dir, top_level, explicit))
    }

    /// Try each source in order. The first success wins; if every source
    /// fails, returns [`ConfigError::NotFound`] listing each attempt.
    pub fn resolve(&self) -> Result<CoordinatorConfig, ConfigError> {
        let mut attempts = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let description = source.describe();
            match source.load() {
                Ok(config) => {
                    tracing::info!(
                        source = %description,
                        specialists = config.specialists.len(),
                        "Loaded coordinator config"
                    );
                    return Ok(config);
                }
                Err(e @ ConfigError::FileNotFound { .. }) => {
                    tracing::debug!(source = %description, "{e}");
                    attempts.push(format!("{description}: {e}"));
                }
                Err(e) => {
                    tracing::warn!(source = %description, "Config source failed: {e}");
                    attempts.push(format!("{description}: {e}"));
                }
            }
        }

        Err(ConfigError::NotFound { attempts })
    }
}

/// Resolve the coordinator configuration for this process and layer CLI
/// overrides on top.
/// Precedence: CLI > config file > defaults.
pub fn load_config(args: &ConfigArgs) -> anyhow::Result<CoordinatorConfig> {
    let explicit = args
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    let resolver = ConfigResolver::for_current_process(explicit)?;
    let config = resolver.resolve()?;
    let config = config.with_overrides(args_to_partial(args))?;

    Ok(config)
}

/// Path of the configuration unit under a search root.
fn unit_path(root: &Path) -> PathBuf {
    root.join(format!("{CONFIG_UNIT}.toml"))
}

/// Read, parse, and extract the configuration from one unit.
fn load_unit(path: &Path) -> Result<CoordinatorConfig, ConfigError> {
    let contents = read_unit(path)?;
    let table = parse_unit(path, &contents)?;
    extract_config(path, table)
}

fn read_unit(path: &Path) -> Result<String, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_unit(path: &Path, contents: &str) -> Result<toml::Table, ConfigError> {
    toml::from_str::<toml::Table>(contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Pull the `[coordinator]` table out of a parsed unit and build the config.
fn extract_config(path: &Path, mut table: toml::Table) -> Result<CoordinatorConfig, ConfigError> {
    let symbol = table
        .remove(CONFIG_SYMBOL)
        .ok_or_else(|| ConfigError::MissingSymbol {
            path: path.to_path_buf(),
            symbol: CONFIG_SYMBOL.to_string(),
        })?;

    let section: CoordinatorSection = symbol.try_into().map_err(|e: toml::de::Error| {
        ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    let partial = section.to_partial();
    let mut specialists = BTreeMap::new();
    for (name, entry) in section.specialists {
        let specialist = entry.into_specialist(&name, path)?;
        specialists.insert(name, specialist);
    }

    partial.finalize(specialists, path.to_path_buf())
}

/// Convert CLI arguments to a PartialConfig for merging.
fn args_to_partial(args: &ConfigArgs) -> PartialConfig {
    PartialConfig {
        name: None,
        default_specialist: args.default_specialist.clone(),
        specialist_timeout_secs: args.timeout,
        max_concurrent_requests: args.max_concurrent,
        degraded_status: args.degraded_status,
    }
}
