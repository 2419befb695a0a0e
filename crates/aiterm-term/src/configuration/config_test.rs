use std::fs;

use anyhow::Result;

use super::*;
use crate::application::cli;

// Config is a process wide registry, so every scenario lives in one test.
#[tokio::test]
async fn test_load_precedence() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config_file = dir.path().join("config.toml");
    let config_file_str = config_file.to_string_lossy().to_string();

    // Defaults when there is no file and no flags.
    let matches = cli::build().try_get_matches_from([
        "aiterm",
        "--config-file",
        &config_file_str,
    ])?;
    Config::load(cli::build(), cli::all_matches(&matches)).await?;
    assert_eq!(Config::get(ConfigKey::Model), "gpt-4o-mini");
    assert_eq!(Config::get(ConfigKey::ModelClient), "openai");
    assert_eq!(Config::get(ConfigKey::ConversationID), "");
    assert!(Config::get(ConfigKey::HistoryDir).ends_with("history"));
    assert_eq!(Config::get(ConfigKey::Temperature), "0.5");
    assert_eq!(Config::get(ConfigKey::TopP), "0.5");
    assert_eq!(Config::get(ConfigKey::MaxTokens), "1024");
    assert_eq!(Config::get(ConfigKey::OutputFormat), "markdown");

    // The file overrides defaults.
    fs::write(
        &config_file,
        "model = \"llama3\"\napi-base = \"http://localhost:11434/v1\"\napi-key = \"\"\n",
    )?;
    Config::load(cli::build(), cli::all_matches(&matches)).await?;
    assert_eq!(Config::get(ConfigKey::Model), "llama3");
    assert_eq!(Config::get(ConfigKey::ApiBase), "http://localhost:11434/v1");

    // Flags override the file, including flags given after a subcommand.
    let matches = cli::build().try_get_matches_from([
        "aiterm",
        "--config-file",
        &config_file_str,
        "--model",
        "mistral",
        "history",
        "list",
        "--conversation-id",
        "c1",
    ])?;
    Config::load(cli::build(), cli::all_matches(&matches)).await?;
    assert_eq!(Config::get(ConfigKey::Model), "mistral");
    assert_eq!(Config::get(ConfigKey::ConversationID), "c1");
    assert_eq!(Config::get(ConfigKey::ApiBase), "http://localhost:11434/v1");

    // Values are validated against the flag's possible values.
    fs::write(&config_file, "model-client = \"carrier-pigeon\"\n")?;
    let err = Config::load(cli::build(), cli::all_matches(&matches))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid value for key 'model-client'"));

    // Numbers may be written bare or quoted.
    fs::write(
        &config_file,
        "temperature = 1.2\ntop-p = \"0.9\"\nmax-tokens = 2048\noutput-format = \"raw\"\n",
    )?;
    Config::load(cli::build(), cli::all_matches(&matches)).await?;
    assert_eq!(Config::get(ConfigKey::Temperature), "1.2");
    assert_eq!(Config::get(ConfigKey::TopP), "0.9");
    assert_eq!(Config::get(ConfigKey::MaxTokens), "2048");
    assert_eq!(Config::get(ConfigKey::OutputFormat), "raw");

    // Numeric ranges are checked for file values too.
    fs::write(&config_file, "top-p = 3.0\n")?;
    let err = Config::load(cli::build(), cli::all_matches(&matches))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid value for key 'top-p'"));

    fs::write(&config_file, "max-tokens = 0\n")?;
    let err = Config::load(cli::build(), cli::all_matches(&matches))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid value for key 'max-tokens'"));

    fs::write(&config_file, "output-format = \"html\"\n")?;
    let err = Config::load(cli::build(), cli::all_matches(&matches))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid value for key 'output-format'"));

    // Flags override the file for sampling options as well.
    fs::write(&config_file, "temperature = 1.2\n")?;
    let matches = cli::build().try_get_matches_from([
        "aiterm",
        "--config-file",
        &config_file_str,
        "--temperature",
        "0.1",
        "-o",
        "raw",
    ])?;
    Config::load(cli::build(), cli::all_matches(&matches)).await?;
    assert_eq!(Config::get(ConfigKey::Temperature), "0.1");
    assert_eq!(Config::get(ConfigKey::OutputFormat), "raw");

    return Ok(());
}

#[test]
fn test_flags_reject_out_of_range_values() {
    for args in [
        ["aiterm", "--temperature", "2.5"],
        ["aiterm", "--temperature", "warm"],
        ["aiterm", "--top-p", "-0.1"],
        ["aiterm", "--max-tokens", "0"],
        ["aiterm", "--output-format", "html"],
    ] {
        assert!(cli::build().try_get_matches_from(args).is_err(), "{args:?}");
    }

    let matches = cli::build()
        .try_get_matches_from(["aiterm", "--top-p", "1", "--max-tokens", "64"])
        .unwrap();
    assert_eq!(matches.get_one::<String>("top-p").unwrap(), "1");
    assert_eq!(matches.get_one::<String>("max-tokens").unwrap(), "64");
}

#[test]
fn test_validate_ranges() {
    assert!(Config::validate(ConfigKey::Temperature, "0").is_ok());
    assert!(Config::validate(ConfigKey::Temperature, "2").is_ok());
    assert_eq!(
        Config::validate(ConfigKey::TopP, "1.5").unwrap_err(),
        "expected a number between 0 and 1, got '1.5'"
    );
    assert!(Config::validate(ConfigKey::MaxTokens, "-3").is_err());
    assert!(Config::validate(ConfigKey::Model, "anything").is_ok());
}

#[test]
fn test_serialize_default() {
    let toml_str = Config::serialize_default(cli::build());

    assert!(toml_str.contains("# The model to chat with.\nmodel = \"gpt-4o-mini\""));
    assert!(toml_str.contains("# API key sent as a bearer token.\n# api-key = \"\""));
    assert!(toml_str.contains("[possible values: openai]\nmodel-client = \"openai\""));
    assert!(toml_str.contains("output.\ntemperature = 0.5"));
    assert!(toml_str.contains("\nmax-tokens = 1024"));
    assert!(toml_str.contains("[possible values: markdown, raw]\noutput-format = \"markdown\""));
    assert!(!toml_str.contains("conversation-id"));
    assert!(!toml_str.contains("config-file"));
}
