use crate::cli::{QueryArgs, SourceArgs};
use crate::error::LitefetchError;
use crate::loader::DEFAULT_ESTIMATED_TOTAL;
use crate::shaper::DEFAULT_ROW_LIMIT;
use directories::ProjectDirs;
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub row_limit: Option<usize>,
    pub verbose: bool,
    pub show_secrets: bool,
    pub progress: bool,
    pub output_file: Option<PathBuf>,
}

/// The remote database and how to fetch it.
#[derive(Debug)]
pub struct SourceConfig {
    pub url: String,
    pub token: Option<SecretString>,
    pub estimated_size: u64,
    pub timeout_secs: Option<u64>,
}

// --- TOML config file structs ---

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    defaults: TomlDefaults,
    #[serde(default)]
    profiles: HashMap<String, TomlProfile>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlDefaults {
    row_limit: Option<usize>,
    estimated_size: Option<u64>,
    timeout: Option<u64>,
    verbose: Option<bool>,
    progress: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
struct TomlProfile {
    url: Option<String>,
    token: Option<String>,
    token_env: Option<String>,
    estimated_size: Option<u64>,
    row_limit: Option<usize>,
}

/// Config path resolution result — distinguishes explicit vs auto-resolved paths.
struct ResolvedConfigPath {
    path: PathBuf,
    /// true if user explicitly specified via --config or LITEFETCH_CONFIG
    explicit: bool,
}

/// Resolve the config file path: --config flag > env var > platform default.
fn resolve_config_path(cli_config: Option<&PathBuf>) -> Option<ResolvedConfigPath> {
    if let Some(path) = cli_config {
        return Some(ResolvedConfigPath { path: path.clone(), explicit: true });
    }
    if let Some(path) = env_non_empty("LITEFETCH_CONFIG") {
        return Some(ResolvedConfigPath { path: PathBuf::from(path), explicit: true });
    }
    ProjectDirs::from("", "", "litefetch")
        .map(|dirs| ResolvedConfigPath {
            path: dirs.config_dir().join("config.toml"),
            explicit: false,
        })
}

/// Load and parse the TOML config file (if it exists).
fn load_toml_config(resolved: Option<&ResolvedConfigPath>) -> Result<TomlConfig, LitefetchError> {
    let resolved = match resolved {
        Some(r) => r,
        None => return Ok(TomlConfig::default()),
    };

    if !resolved.path.exists() {
        if resolved.explicit {
            return Err(LitefetchError::Config {
                message: format!("config file not found: {}", resolved.path.display()),
            });
        }
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&resolved.path).map_err(|e| LitefetchError::Config {
        message: format!("cannot read config file {}: {}", resolved.path.display(), e),
    })?;

    toml::from_str(&content).map_err(|e| LitefetchError::Config {
        message: format!("invalid config file {}: {}", resolved.path.display(), e),
    })
}

/// Treat an empty string the same as an absent value.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Read an env var, ignoring it when unset or empty.
pub fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve a token from direct value, then env indirection, then the profile.
fn resolve_secret(
    direct: Option<&str>,
    env_key: Option<&str>,
    profile_value: Option<&str>,
) -> Option<SecretString> {
    if let Some(val) = non_empty(direct) {
        return Some(SecretString::from(val.to_string()));
    }
    // Env indirection (e.g., token_env = "MY_TOKEN")
    if let Some(key) = non_empty(env_key)
        && let Some(val) = env_non_empty(key)
    {
        return Some(SecretString::from(val));
    }
    non_empty(profile_value).map(|val| SecretString::from(val.to_string()))
}

/// Look up `--profile` in the config file, if one was named.
fn select_profile(args: &SourceArgs, toml_config: &TomlConfig) -> Result<TomlProfile, LitefetchError> {
    let profile = args
        .profile
        .as_ref()
        .map(|name| {
            toml_config.profiles.get(name).cloned().ok_or_else(|| LitefetchError::Config {
                message: format!("profile '{}' not found in config file", name),
            })
        })
        .transpose()?;
    Ok(profile.unwrap_or_default())
}

fn resolve_source(
    args: &SourceArgs,
    profile: &TomlProfile,
    defaults: &TomlDefaults,
) -> Result<SourceConfig, LitefetchError> {
    // url: CLI/ENV > profile > error
    let url = non_empty(args.url.as_deref())
        .or(non_empty(profile.url.as_deref()))
        .ok_or_else(|| LitefetchError::Config {
            message: "no database URL specified — use --url or configure a profile".to_string(),
        })?
        .to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(LitefetchError::Config {
            message: format!("unsupported URL '{}' (expected http:// or https://)", url),
        });
    }

    let token = resolve_secret(
        args.token.as_deref(),
        profile.token_env.as_deref(),
        profile.token.as_deref(),
    );

    // estimated_size: CLI/ENV > profile > TOML defaults > 800 MB
    let estimated_size = args
        .estimated_size
        .or(profile.estimated_size)
        .or(defaults.estimated_size)
        .unwrap_or(DEFAULT_ESTIMATED_TOTAL);

    if estimated_size == 0 {
        return Err(LitefetchError::Config {
            message: "estimated size must be greater than zero".to_string(),
        });
    }

    Ok(SourceConfig {
        url,
        token,
        estimated_size,
        timeout_secs: args.timeout.or(defaults.timeout),
    })
}

/// Build AppConfig from `query` CLI args.
pub fn load_from_query_args(
    args: &QueryArgs,
    verbose: bool,
    show_secrets: bool,
    config_path: Option<&PathBuf>,
) -> Result<AppConfig, LitefetchError> {
    let resolved_path = resolve_config_path(config_path);
    let toml_config = load_toml_config(resolved_path.as_ref())?;
    let profile = select_profile(&args.source, &toml_config)?;
    let source = resolve_source(&args.source, &profile, &toml_config.defaults)?;

    // row_limit: --no-limit > CLI/ENV > profile > TOML defaults > 25
    let row_limit = if args.no_limit {
        None
    } else {
        Some(
            args.limit
                .or(profile.row_limit)
                .or(toml_config.defaults.row_limit)
                .unwrap_or(DEFAULT_ROW_LIMIT),
        )
    };

    Ok(AppConfig {
        source,
        row_limit,
        verbose: verbose || toml_config.defaults.verbose.unwrap_or(false),
        show_secrets,
        progress: args.source.progress || toml_config.defaults.progress.unwrap_or(false),
        output_file: args.output.clone(),
    })
}

/// Build AppConfig for the `schema` and `fetch` subcommands.
pub fn load_from_source_args(
    args: &SourceArgs,
    verbose: bool,
    show_secrets: bool,
    config_path: Option<&PathBuf>,
) -> Result<AppConfig, LitefetchError> {
    let resolved_path = resolve_config_path(config_path);
    let toml_config = load_toml_config(resolved_path.as_ref())?;
    let profile = select_profile(args, &toml_config)?;
    let source = resolve_source(args, &profile, &toml_config.defaults)?;

    Ok(AppConfig {
        source,
        row_limit: Some(
            profile
                .row_limit
                .or(toml_config.defaults.row_limit)
                .unwrap_or(DEFAULT_ROW_LIMIT),
        ),
        verbose: verbose || toml_config.defaults.verbose.unwrap_or(false),
        show_secrets,
        progress: args.progress || toml_config.defaults.progress.unwrap_or(false),
        output_file: None,
    })
}
