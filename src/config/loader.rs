//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::MigrationConfig;
use crate::domain::errors::MigrationError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into MigrationConfig
/// 4. Applies environment variable overrides (P3Z_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`MigrationError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails, or validation
/// rejects the result.
///
/// # Examples
///
/// ```no_run
/// use papers3_zotero::config::loader::load_config;
///
/// let config = load_config("papers3-zotero.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<MigrationConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MigrationError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        MigrationError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut config = parse_config(&contents)?;
    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        MigrationError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Parses configuration text after `${VAR}` substitution, without validating
pub fn parse_config(contents: &str) -> Result<MigrationConfig> {
    let contents = substitute_env_vars(contents)?;
    toml::from_str(&contents)
        .map_err(|e| MigrationError::Configuration(format!("Failed to parse TOML: {e}")))
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is a valid regex")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = placeholder_pattern();
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(MigrationError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Applies environment variable overrides using the P3Z_* prefix
///
/// Environment variables follow the pattern `P3Z_<SECTION>_<KEY>`, for
/// example `P3Z_STORE_PATH` or `P3Z_IMPORT_DRY_RUN`. Unparseable values are
/// ignored.
fn apply_env_overrides(config: &mut MigrationConfig) {
    if let Ok(val) = std::env::var("P3Z_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("P3Z_SOURCE_CATALOG_DIR") {
        config.source.catalog_dir = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("P3Z_SOURCE_ATTACHMENTS_ROOT") {
        config.source.attachments_root = Some(PathBuf::from(val));
    }

    if let Ok(val) = std::env::var("P3Z_STORE_PATH") {
        config.store.path = PathBuf::from(val);
    }
    if let Some(id) = env_parse("P3Z_STORE_LIBRARY_ID") {
        config.store.library_id = id;
    }
    if let Some(secs) = env_parse("P3Z_STORE_BUSY_TIMEOUT_SECS") {
        config.store.busy_timeout_secs = secs;
    }

    if let Some(flag) = env_flag("P3Z_IMPORT_DRY_RUN") {
        config.import.dry_run = flag;
    }
    if let Some(limit) = env_parse("P3Z_IMPORT_LIMIT") {
        config.import.limit = Some(limit);
    }
    if let Some(flag) = env_flag("P3Z_IMPORT_SKIP_ATTACHMENTS") {
        config.import.skip_attachments = flag;
    }
    if let Some(flag) = env_flag("P3Z_IMPORT_FILES_ONLY") {
        config.import.files_only = flag;
    }

    if let Some(flag) = env_flag("P3Z_FILES_ORGANIZE") {
        config.files.organize = flag;
    }
    if let Ok(val) = std::env::var("P3Z_FILES_TARGET_ROOT") {
        config.files.target_root = Some(PathBuf::from(val));
    }
    if let Some(max) = env_parse("P3Z_FILES_MAX_NUMBERED_VARIANT") {
        config.files.max_numbered_variant = max;
    }

    if let Some(flag) = env_flag("P3Z_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = flag;
    }
    if let Ok(val) = std::env::var("P3Z_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("P3Z_TEST_HOME", "/home/reader");
        let input = "path = \"${P3Z_TEST_HOME}/Zotero/zotero.sqlite\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(
            result.trim_end(),
            "path = \"/home/reader/Zotero/zotero.sqlite\""
        );
        std::env::remove_var("P3Z_TEST_HOME");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("P3Z_TEST_MISSING");
        let result = substitute_env_vars("path = \"${P3Z_TEST_MISSING}\"");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("P3Z_TEST_MISSING"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("P3Z_TEST_COMMENTED");
        let input = "# path = \"${P3Z_TEST_COMMENTED}\"\nlimit = 5";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(MigrationError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[source]
catalog_dir = "/data/catalog"
attachments_root = "/data/Papers3/Files"

[store]
path = "/data/zotero.sqlite"
library_id = 1

[import]
limit = 25

[files]
organize = true
target_root = "/data/organized"
max_numbered_variant = 5
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.store.path, PathBuf::from("/data/zotero.sqlite"));
        assert_eq!(config.import.limit, Some(25));
        assert_eq!(config.files.max_numbered_variant, 5);
        assert_eq!(
            config.source.attachments_root,
            Some(PathBuf::from("/data/Papers3/Files"))
        );
    }

    #[test]
    fn test_load_config_rejects_conflicting_parameters() {
        let toml_content = r#"
[store]
path = "/data/zotero.sqlite"

[import]
skip_attachments = true

[files]
organize = true
target_root = "/data/organized"
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.is_fatal_setup());
        assert!(err.to_string().contains("skip_attachments"));
    }
}
