//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::CustodiaConfig;
use crate::domain::errors::CustodiaError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`CustodiaConfig`]
/// 4. Applies environment variable overrides (`CUSTODIA_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use custodia::config::load_config;
///
/// let config = load_config("custodia.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CustodiaConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CustodiaError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CustodiaError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: CustodiaConfig = toml::from_str(&contents)
        .map_err(|e| CustodiaError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        CustodiaError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched so documented placeholders don't fail
/// the load.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(CustodiaError::Configuration(format!(
            "Missing environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies `CUSTODIA_*` environment variable overrides to the parsed config
fn apply_env_overrides(config: &mut CustodiaConfig) -> Result<()> {
    use crate::config::schema::SecurityLevel;

    if let Ok(val) = std::env::var("CUSTODIA_SECURITY_LEVEL") {
        config.security_level = match val.to_lowercase().as_str() {
            "low" => SecurityLevel::Low,
            "medium" => SecurityLevel::Medium,
            "high" => SecurityLevel::High,
            "maximum" => SecurityLevel::Maximum,
            other => {
                return Err(CustodiaError::Configuration(format!(
                    "Invalid CUSTODIA_SECURITY_LEVEL: {other}"
                )))
            }
        };
    }

    if let Ok(val) = std::env::var("CUSTODIA_LOG_LEVEL") {
        config.logging.log_level = val;
    }

    if let Ok(val) = std::env::var("CUSTODIA_KEYS_STORE_DIR") {
        config.keys.store_dir = val.into();
    }

    if let Ok(val) = std::env::var("CUSTODIA_AUDIT_HISTORY_LIMIT") {
        config.audit.history_limit = val.parse().map_err(|_| {
            CustodiaError::Configuration(format!("Invalid CUSTODIA_AUDIT_HISTORY_LIMIT: {val}"))
        })?;
    }

    Ok(())
}
