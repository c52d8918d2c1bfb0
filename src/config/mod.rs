//! Layered configuration.
//!
//! Precedence, lowest to highest:
//!
//! 1. built-in defaults
//! 2. project file (`<repo-root>/parity.yaml`, or `--config <path>`)
//! 3. environment (`MPARITY_<KEY>`, e.g. `MPARITY_DIFF_MAX_DIFF_LINES`)
//! 4. command-line flags
//!
//! Every layer is a flat string map. Keys compare with `.`, `-` and `_`
//! treated alike, so `diff.max-diff-lines` and `DIFF_MAX_DIFF_LINES` name
//! the same setting. The merged layer is then resolved into a typed
//! [`HarnessConfig`].

use crate::bench::Thresholds;
use crate::engine::{ProcessEngine, TargetModifiers};
use crate::error::{ParityError, Result, ResultExt};
use crate::report::Enforcement;
use crate::util::absolutize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Project config file looked up in the repository root.
pub const PROJECT_CONFIG_FILE: &str = "parity.yaml";
const ENV_PREFIX: &str = "MPARITY_";
const TARGET_MODIFIERS_PREFIX: &str = "target_modifiers_";

const DEFAULTS: &[(&str, &str)] = &[
    (
        "legacy.bin",
        "compiler/jvm/target/universal/stage/bin/kaitai-struct-compiler",
    ),
    ("legacy.args", "--verbose,file"),
    ("migrated.bin", "compiler-cpp/build/kscpp"),
    ("migrated.args", ""),
    ("migrated.targets", "cpp_stl"),
    ("target-modifiers.cpp_stl", "--cpp-standard,17"),
    ("import-dirs", "tests/formats,formats"),
    ("ir-extension", "ksir"),
    ("spec-extension", "ksy"),
    (
        "diff.fixtures",
        "tests/migration_golden/cpp17_differential_fixtures.tsv",
    ),
    ("diff.output-dir", "tests/test_out/migration_differential"),
    ("diff.max-diff-lines", "80"),
    ("diff.enforce-gate", "all"),
    ("bench.fixtures", "tests/migration_golden/benchmark_fixtures.tsv"),
    ("bench.output-dir", "tests/test_out/migration_benchmarks"),
    ("bench.iterations", "5"),
    ("bench.warmup", "1"),
    ("bench.latency-ratio-max", "2.0"),
    ("bench.memory-ratio-max", "2.0"),
    ("bench.stability-cv-max", "0.20"),
    ("time-bin", "/usr/bin/time"),
];

/// One flat layer of configuration values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    values: HashMap<String, String>,
}

impl ConfigLayer {
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Built-in defaults.
    #[must_use]
    pub fn defaults() -> Self {
        let mut layer = Self::default();
        for (key, value) in DEFAULTS {
            layer.set(key, *value);
        }
        layer
    }

    /// Build a layer from a YAML file. A missing file is an empty layer
    /// unless `required` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or is required
    /// and missing.
    pub fn from_yaml(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                return Err(ParityError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }

        let contents =
            fs::read_to_string(path).context_with(|| format!("reading {}", path.display()))?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        let mut layer = Self::default();
        flatten_yaml(&value, "", &mut layer);
        debug!(path = %path.display(), keys = layer.len(), "loaded config file");
        Ok(layer)
    }

    /// Build a layer from `MPARITY_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.set(stripped, value);
            }
        }
        layer
    }

    /// Every `target-modifiers.<target>` entry.
    fn target_modifiers(&self) -> BTreeMap<String, Vec<String>> {
        self.values
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(TARGET_MODIFIERS_PREFIX)
                    .map(|target| (target.to_string(), split_list(value)))
            })
            .collect()
    }
}

/// Values set from command-line flags (highest precedence).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    layer: ConfigLayer,
}

impl CliOverrides {
    pub fn set(&mut self, key: &str, value: impl Display) {
        self.layer.set(key, value.to_string());
    }

    pub fn set_opt<T: Display>(&mut self, key: &str, value: Option<T>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }

    pub fn set_path(&mut self, key: &str, value: Option<&Path>) {
        if let Some(path) = value {
            self.layer.set(key, path.to_string_lossy());
        }
    }

    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        self.layer.clone()
    }
}

/// One engine's binary and fixed leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub bin: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffConfig {
    pub fixtures: PathBuf,
    pub output_dir: PathBuf,
    pub max_diff_lines: usize,
    pub enforcement: Enforcement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub fixtures: PathBuf,
    pub output_dir: PathBuf,
    pub iterations: usize,
    pub warmup: usize,
    pub thresholds: Thresholds,
}

/// Fully resolved harness configuration. All paths are absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub repo_root: PathBuf,
    pub legacy: EngineConfig,
    pub migrated: EngineConfig,
    /// Targets the migrated engine supports.
    pub migrated_targets: BTreeSet<String>,
    pub target_modifiers: TargetModifiers,
    pub import_dirs: Vec<PathBuf>,
    pub spec_extension: String,
    pub ir_extension: String,
    pub time_bin: PathBuf,
    pub invocation_timeout: Option<Duration>,
    pub diff: DiffConfig,
    pub bench: BenchConfig,
}

impl HarnessConfig {
    /// Resolve a merged layer.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for any unparsable or out-of-range value.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let repo_root = resolve_repo_root(layer.get("repo-root"))?;
        let path = |key: &str| -> Result<PathBuf> {
            let raw = required(layer, key)?;
            Ok(absolutize(&repo_root, Path::new(raw)))
        };

        let mut target_modifiers = TargetModifiers::new(BTreeMap::new());
        for (target, flags) in layer.target_modifiers() {
            target_modifiers.set(target, flags);
        }

        let thresholds = Thresholds {
            latency_ratio_max: parse_ratio(layer, "bench.latency-ratio-max")?,
            memory_ratio_max: parse_ratio(layer, "bench.memory-ratio-max")?,
            stability_cv_max: parse_ratio(layer, "bench.stability-cv-max")?,
        };

        let iterations: usize = parse_value(layer, "bench.iterations")?;
        if iterations == 0 {
            return Err(ParityError::config("bench.iterations must be at least 1"));
        }

        let enforce = required(layer, "diff.enforce-gate")?;
        let enforcement = Enforcement::parse(enforce).ok_or_else(|| {
            ParityError::config(format!(
                "diff.enforce-gate must be none, required or all (got '{enforce}')"
            ))
        })?;

        let invocation_timeout = match layer.get("invocation-timeout-secs").map(str::trim) {
            None | Some("") => None,
            Some(_) => {
                let secs: u64 = parse_value(layer, "invocation-timeout-secs")?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
        };

        let config = Self {
            legacy: EngineConfig {
                bin: path("legacy.bin")?,
                args: split_list(layer.get("legacy.args").unwrap_or_default()),
            },
            migrated: EngineConfig {
                bin: path("migrated.bin")?,
                args: split_list(layer.get("migrated.args").unwrap_or_default()),
            },
            migrated_targets: split_list(layer.get("migrated.targets").unwrap_or_default())
                .into_iter()
                .collect(),
            target_modifiers,
            import_dirs: split_list(layer.get("import-dirs").unwrap_or_default())
                .iter()
                .map(|dir| absolutize(&repo_root, Path::new(dir)))
                .collect(),
            spec_extension: extension(layer, "spec-extension")?,
            ir_extension: extension(layer, "ir-extension")?,
            time_bin: executable_path(&repo_root, required(layer, "time-bin")?),
            invocation_timeout,
            diff: DiffConfig {
                fixtures: path("diff.fixtures")?,
                output_dir: path("diff.output-dir")?,
                max_diff_lines: parse_value(layer, "diff.max-diff-lines")?,
                enforcement,
            },
            bench: BenchConfig {
                fixtures: path("bench.fixtures")?,
                output_dir: path("bench.output-dir")?,
                iterations,
                warmup: parse_value(layer, "bench.warmup")?,
                thresholds,
            },
            repo_root,
        };
        Ok(config)
    }

    #[must_use]
    pub fn legacy_engine(&self) -> ProcessEngine {
        ProcessEngine::new("legacy", &self.legacy.bin, &self.repo_root)
            .with_prefix_args(self.legacy.args.clone())
            .with_modifiers(self.target_modifiers.clone())
            .with_timeout(self.invocation_timeout)
            .with_install_hint("build the legacy compiler stage first (tests/build-compiler) or set legacy.bin")
    }

    #[must_use]
    pub fn migrated_engine(&self) -> ProcessEngine {
        ProcessEngine::new("migrated", &self.migrated.bin, &self.repo_root)
            .with_prefix_args(self.migrated.args.clone())
            .with_modifiers(self.target_modifiers.clone())
            .with_timeout(self.invocation_timeout)
            .with_install_hint(
                "run cmake -S compiler-cpp -B compiler-cpp/build && cmake --build compiler-cpp/build, or set migrated.bin",
            )
    }
}

/// Load configuration with the full precedence chain.
///
/// The repository root is settled first (defaults, env, CLI) because the
/// project file lives inside it.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or any
/// value is invalid.
pub fn load_config(config_path: Option<&Path>, cli: &CliOverrides) -> Result<HarnessConfig> {
    let defaults = ConfigLayer::defaults();
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    let early = ConfigLayer::merge_layers(&[defaults.clone(), env_layer.clone(), cli_layer.clone()]);
    let repo_root = resolve_repo_root(early.get("repo-root"))?;

    let project = match config_path {
        Some(path) => ConfigLayer::from_yaml(path, true)?,
        None => ConfigLayer::from_yaml(&repo_root.join(PROJECT_CONFIG_FILE), false)?,
    };

    let mut merged = ConfigLayer::merge_layers(&[defaults, project, env_layer, cli_layer]);
    if merged.get("repo-root").is_none() {
        merged.set("repo-root", repo_root.to_string_lossy());
    }
    HarnessConfig::from_layer(&merged)
}

fn resolve_repo_root(raw: Option<&str>) -> Result<PathBuf> {
    let root = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => PathBuf::from(raw),
        None => env::current_dir()?,
    };
    fs::canonicalize(&root).map_err(|err| {
        ParityError::config(format!("repo-root {} is not usable: {err}", root.display()))
    })
}

/// Bare program names stay as-is for `PATH` lookup; anything with a
/// directory part is anchored at the repo root.
fn executable_path(root: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.components().count() > 1 {
        absolutize(root, path)
    } else {
        path.to_path_buf()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(['.', '-'], "_")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn required<'a>(layer: &'a ConfigLayer, key: &str) -> Result<&'a str> {
    layer
        .get(key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ParityError::config(format!("{key} must be set")))
}

fn parse_value<T>(layer: &ConfigLayer, key: &str) -> Result<T>
where
    T: std::str::FromStr,
{
    let raw = required(layer, key)?;
    raw.parse::<T>()
        .map_err(|_| ParityError::config(format!("{key} has invalid value '{raw}'")))
}

fn parse_ratio(layer: &ConfigLayer, key: &str) -> Result<f64> {
    let value: f64 = parse_value(layer, key)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ParityError::config(format!(
            "{key} must be a positive number (got {value})"
        )));
    }
    Ok(value)
}

fn extension(layer: &ConfigLayer, key: &str) -> Result<String> {
    Ok(required(layer, key)?.trim_start_matches('.').to_string())
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut ConfigLayer) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.set(prefix, joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.set(prefix, value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
