//! wiki2doc CLI: parse wikitext files into JSON documents.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use wiki2doc::{Config, Result};

/// Parse MediaWiki markup into structured JSON documents
#[derive(Parser, Debug)]
#[command(name = "wiki2doc", version, about)]
struct Cli {
    /// Wikitext files, or directories searched for *.wiki and *.txt files
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Keep list items in sections instead of dropping them
    #[arg(long)]
    lists: bool,

    /// Treat this template name as an infobox (repeatable)
    #[arg(long = "infobox", value_name = "NAME")]
    infobox: Vec<String>,

    /// JSON file with parser options (ignoreLists, infoboxTemplates, ...)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print one compact JSON object per line instead of pretty JSON
    #[arg(long)]
    compact: bool,
}

impl Cli {
    /// Options from `--config`, then the flags on top.
    fn parser_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                if !path.exists() {
                    return Err(wiki2doc::Error::NotFound(path.clone()));
                }
                let text = fs::read_to_string(path)?;
                let value: serde_json::Value = serde_json::from_str(&text)?;
                Config::from_json_value(&value)
            }
            None => Config::default(),
        };
        if self.lists {
            config.ignore_lists = false;
        }
        config.infobox_templates.extend(self.infobox.iter().cloned());
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.parser_config()?;
    log::debug!("config: {config:?}");

    for path in &cli.paths {
        for file in wiki2doc::parse_path(path, &config)? {
            if !file.diagnostics.is_empty() {
                log::info!(
                    "{}: {} recoveries",
                    file.source.path.as_deref().unwrap_or("-"),
                    file.diagnostics.len()
                );
            }
            let json = if cli.compact {
                serde_json::to_string(&file)?
            } else {
                serde_json::to_string_pretty(&file)?
            };
            println!("{json}");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("wiki2doc: {err}");
            ExitCode::FAILURE
        }
    }
}
