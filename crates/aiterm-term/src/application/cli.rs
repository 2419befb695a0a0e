use std::io;

use aiterm_core::HistoryStore;
use aiterm_core::Role;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgMatches;
use clap::Command;
use clap_complete::Shell;
use strum::VariantNames;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ModelName;
use crate::domain::models::OutputFormat;
use crate::domain::services::Renderer;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn config_arg(key: ConfigKey, help: &str) -> Arg {
    let env_name = format!(
        "AITERM_{}",
        key.to_string().to_uppercase().replace('-', "_")
    );

    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env_name)
        .num_args(1)
        .global(true)
        .help(help.to_string());
}

pub fn build() -> Command {
    let history = Command::new("history")
        .about("Manage saved conversations.")
        .subcommand_required(true)
        .subcommand(Command::new("list").about("List saved conversations, newest first."))
        .subcommand(
            Command::new("show")
                .about("Print every message of a conversation.")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("remove")
                .visible_alias("rm")
                .about("Delete a saved conversation.")
                .arg(Arg::new("id").required(true)),
        );

    return Command::new("aiterm")
        .about("Chat with a language model from your terminal.")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(
            Command::new("completions")
                .about("Generates shell completions.")
                .arg(
                    Arg::new("shell")
                        .short('s')
                        .long("shell")
                        .required(true)
                        .value_parser(value_parser!(Shell))
                        .help("Which shell to generate completions for."),
                ),
        )
        .subcommand(Command::new("manpages").about("Generates manpages to stdout."))
        .subcommand(
            Command::new("config")
                .about("Configuration file helpers.")
                .subcommand_required(true)
                .subcommand(
                    Command::new("default").about("Prints a config.toml with every default."),
                ),
        )
        .subcommand(history)
        .arg(
            config_arg(ConfigKey::ModelClient, "The model backend to talk to.")
                .value_parser(PossibleValuesParser::new(ModelName::VARIANTS.iter().copied())),
        )
        .arg(config_arg(
            ConfigKey::ApiBase,
            "Base URL of the OpenAI compatible API.",
        ))
        .arg(config_arg(ConfigKey::ApiKey, "API key sent as a bearer token."))
        .arg(config_arg(ConfigKey::Model, "The model to chat with."))
        .arg(
            config_arg(
                ConfigKey::Temperature,
                "Sampling temperature to control the randomness of the output.",
            )
            .value_parser(|val: &str| return Config::validate(ConfigKey::Temperature, val)),
        )
        .arg(
            config_arg(
                ConfigKey::TopP,
                "Nucleus sampling to control the probability mass of the output.",
            )
            .value_parser(|val: &str| return Config::validate(ConfigKey::TopP, val)),
        )
        .arg(
            config_arg(
                ConfigKey::MaxTokens,
                "The maximum number of tokens the model can output.",
            )
            .value_parser(|val: &str| return Config::validate(ConfigKey::MaxTokens, val)),
        )
        .arg(
            config_arg(ConfigKey::OutputFormat, "How replies are rendered.")
                .short('o')
                .value_parser(PossibleValuesParser::new(OutputFormat::VARIANTS.iter().copied())),
        )
        .arg(config_arg(
            ConfigKey::HistoryDir,
            "Directory holding one file per saved conversation.",
        ))
        .arg(
            config_arg(
                ConfigKey::ConversationID,
                "Resume an existing conversation. A new one is started when empty.",
            )
            .short('c'),
        )
        .arg(config_arg(ConfigKey::ConfigFile, "Path to configuration file."))
        .arg(
            config_arg(ConfigKey::LogLevel, "Verbosity of the log file.")
                .value_parser(PossibleValuesParser::new(LOG_LEVELS)),
        );
}

/// Matches of the command and of every nested subcommand, outermost first.
pub fn all_matches(matches: &ArgMatches) -> Vec<&ArgMatches> {
    let mut res = vec![matches];
    let mut current = matches;
    while let Some((_, sub_matches)) = current.subcommand() {
        res.push(sub_matches);
        current = sub_matches;
    }

    return res;
}

/// Renderer for the configured output format.
pub fn renderer() -> Renderer {
    let format = OutputFormat::parse(&Config::get(ConfigKey::OutputFormat)).unwrap_or_default();
    return Renderer::new(format);
}

fn print_history(action: &ArgMatches, store: &mut HistoryStore) -> Result<()> {
    let renderer = renderer();

    match action.subcommand() {
        Some(("list", _)) => {
            let summaries = store.list()?;
            if summaries.is_empty() {
                println!(
                    "{}",
                    renderer.render_comment(&format!(
                        "No saved conversations in {}",
                        store.dir().display()
                    ))
                );
            }
            for summary in summaries {
                println!(
                    "{}  {:>4} messages  {}",
                    summary.id,
                    summary.message_count,
                    renderer.render_comment(&summary.modified.format("%Y-%m-%d %H:%M").to_string())
                );
            }
        }
        Some(("show", args)) => {
            let id = args.get_one::<String>("id").map(String::as_str).unwrap_or("");
            for message in store.get_messages(id)? {
                let author = match message.role {
                    Role::Human => renderer.render_success("You"),
                    Role::Ai => renderer.render_warning("AI"),
                };
                println!("{author}: {}\n", renderer.render_content(&message.content));
            }
        }
        Some(("remove", args)) => {
            let id = args.get_one::<String>("id").map(String::as_str).unwrap_or("");
            store.delete(id)?;
            println!("{}", renderer.render_success(&format!("Removed conversation {id}")));
        }
        _ => {}
    }

    return Ok(());
}

/// Runs the one-shot subcommands. Returns true when one was handled and the
/// interactive session should not start.
pub fn handle_subcommands(matches: &ArgMatches) -> Result<bool> {
    match matches.subcommand() {
        Some(("completions", subcmd_matches)) => {
            if let Some(shell) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                clap_complete::generate(shell, &mut app, "aiterm", &mut io::stdout());
            }
        }
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
        }
        Some(("config", subcmd_matches)) => {
            if let Some(("default", _)) = subcmd_matches.subcommand() {
                println!("{}", Config::serialize_default(build()));
            }
        }
        Some(("history", subcmd_matches)) => {
            let mut store = HistoryStore::new(Config::get(ConfigKey::HistoryDir));
            print_history(subcmd_matches, &mut store)?;
        }
        _ => return Ok(false),
    }

    return Ok(true);
}
