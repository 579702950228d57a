use std::env;

use config::{
    Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, FileStoredFormat,
    builder::DefaultState,
};

use crate::{log_debug, log_warn};

pub const CONFIG_STR: &str = "CONFIG_STR";
pub const CONFIG_STR_FORMAT: &str = "CONFIG_STR_FMT";

/// Loads the layered configuration of a tool.
///
/// Sources, from the lowest to the highest priority:
/// 1. Whatever `config_builder` sets (usually defaults).
/// 2. A file named `file_name` (any supported extension), searched in the
///    ancestors of the current directory. Optional.
/// 3. An inline configuration string in `{env_prefix}_CONFIG_STR`, with its
///    format given in `{env_prefix}_CONFIG_STR_FMT`.
/// 4. Environment variables `{env_prefix}_<KEY>`, nested keys separated by `__`.
pub fn load_config(
    file_name: &str,
    env_prefix: &str,
    config_builder: impl FnOnce(
        ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError>,
) -> Result<Config, ConfigError> {
    let mut builder = config_builder(Config::builder())?;
    builder = builder.add_source(
        File::with_name(
            &crate::utils::search_current_ancestor_dirs_for(file_name)
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|| file_name.to_string()),
        )
        .required(false),
    );
    if let Some((str, format)) = Option::zip(
        env::var(format!("{env_prefix}_{CONFIG_STR}")).ok(),
        env::var(format!("{env_prefix}_{CONFIG_STR_FORMAT}")).ok(),
    ) {
        if let Ok(format) = try_parse_format(&format) {
            builder = builder.add_source(File::from_str(str.as_str(), format));
        } else {
            log_warn!("Unknown format for config string: {}", format);
        }
    }
    builder = builder.add_source(
        Environment::with_prefix(env_prefix)
            .prefix_separator("_")
            .separator("__"),
    );

    builder
        .build()
        .inspect(|c| log_debug!("Loaded raw configurations: {:?}", c))
}

fn try_parse_format(format: &str) -> Result<FileFormat, &str> {
    use FileFormat::*;
    let all_formats = [Toml, Json, Json5, Yaml, Ron, Ini];
    all_formats
        .into_iter()
        .find(|f| f.file_extensions().contains(&format))
        .ok_or(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lookup_by_extension() {
        assert!(matches!(try_parse_format("toml"), Ok(FileFormat::Toml)));
        assert!(matches!(try_parse_format("json"), Ok(FileFormat::Json)));
        assert_eq!(try_parse_format("xml").unwrap_err(), "xml");
    }

    #[test]
    fn test_defaults_are_kept_without_other_sources() {
        let config = load_config("summle_test_config_not_present", "SUMMLE_TEST_NONE", |b| {
            b.set_default("cpu_limit_s", 30)
        })
        .unwrap();
        assert_eq!(config.get_int("cpu_limit_s").unwrap(), 30);
    }
}
