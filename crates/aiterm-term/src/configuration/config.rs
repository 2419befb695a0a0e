#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::ModelName;
use crate::domain::models::OutputFormat;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ApiBase,
    ApiKey,
    ConfigFile,
    ConversationID,
    HistoryDir,
    LogLevel,
    MaxTokens,
    Model,
    ModelClient,
    OutputFormat,
    Temperature,
    TopP,
}

pub struct Config {}

fn app_dir(base: Option<path::PathBuf>) -> path::PathBuf {
    return base.unwrap_or_else(env::temp_dir).join("aiterm");
}

fn parse_float_in(val: &str, min: f64, max: f64) -> Result<String, String> {
    return match val.parse::<f64>() {
        Ok(num) if (min..=max).contains(&num) => Ok(val.to_string()),
        _ => Err(format!("expected a number between {min} and {max}, got '{val}'")),
    };
}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn log_dir() -> path::PathBuf {
        return app_dir(dirs::cache_dir());
    }

    pub fn default(key: ConfigKey) -> String {
        #[allow(unused_assignments)]
        let mut config_path = app_dir(dirs::config_dir()).join("config.toml");

        #[cfg(target_os = "macos")]
        {
            if let Ok(home) = env::var("HOME") {
                config_path = path::PathBuf::from(home).join(".config/aiterm/config.toml");
            }
        }

        #[cfg(target_os = "linux")]
        {
            if !config_path.exists() {
                config_path = app_dir(dirs::config_local_dir()).join("config.toml");
            }
        }

        let history_dir = app_dir(dirs::cache_dir()).join("history");

        let res = match key {
            ConfigKey::ApiBase => "https://api.openai.com/v1".to_string(),
            ConfigKey::ApiKey => "".to_string(),
            ConfigKey::HistoryDir => history_dir.to_string_lossy().to_string(),
            ConfigKey::LogLevel => "info".to_string(),
            ConfigKey::MaxTokens => "1024".to_string(),
            ConfigKey::Model => "gpt-4o-mini".to_string(),
            ConfigKey::ModelClient => ModelName::default().to_string(),
            ConfigKey::OutputFormat => OutputFormat::default().to_string(),
            ConfigKey::Temperature => "0.5".to_string(),
            ConfigKey::TopP => "0.5".to_string(),

            // Special
            ConfigKey::ConfigFile => config_path.to_string_lossy().to_string(),
            ConfigKey::ConversationID => "".to_string(),
        };

        return res;
    }

    /// Checks a raw value for keys with a numeric range. Shared by the clap
    /// value parsers and the `config.toml` loader.
    pub fn validate(key: ConfigKey, val: &str) -> Result<String, String> {
        return match key {
            ConfigKey::Temperature => parse_float_in(val, 0.0, 2.0),
            ConfigKey::TopP => parse_float_in(val, 0.0, 1.0),
            ConfigKey::MaxTokens => match val.parse::<u32>() {
                Ok(num) if num > 0 => Ok(val.to_string()),
                _ => Err(format!("expected a positive integer, got '{val}'")),
            },
            _ => Ok(val.to_string()),
        };
    }

    /// Resolves every key: built in defaults, then `config.toml`, then flags
    /// and environment variables.
    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    {
                        possible_values = arg
                            .get_possible_values()
                            .iter()
                            .map(|e| return e.get_name().to_string())
                            .collect::<Vec<String>>();
                    }

                    let val_str = if let Some(val_int) = val.as_integer() {
                        val_int.to_string()
                    } else if let Some(val_float) = val.as_float() {
                        val_float.to_string()
                    } else if let Some(val_str) = val.as_str() {
                        val_str.to_string()
                    } else {
                        continue;
                    };

                    if val_str.is_empty() {
                        continue;
                    }
                    if !possible_values.is_empty() && !possible_values.contains(&val_str) {
                        bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                    }
                    if let Err(err) = Config::validate(key, &val_str) {
                        bail!(format!(
                            "config.toml has an invalid value for key '{key}': {err}"
                        ));
                    }
                    Config::set(key, &val_str);
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        return Ok(());
    }

    /// Logs the resolved settings. Called once the subscriber is installed,
    /// since the log level itself comes from `load`.
    pub fn log_summary() {
        tracing::debug!(
            model_client = %Config::get(ConfigKey::ModelClient),
            model = %Config::get(ConfigKey::Model),
            temperature = %Config::get(ConfigKey::Temperature),
            top_p = %Config::get(ConfigKey::TopP),
            max_tokens = %Config::get(ConfigKey::MaxTokens),
            output_format = %Config::get(ConfigKey::OutputFormat),
            history_dir = %Config::get(ConfigKey::HistoryDir),
            "config"
        );
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConversationID || key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<f64>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
