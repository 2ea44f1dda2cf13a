//! CLI binary for search-comparisons.
//!
//! Every subcommand prints pretty JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scholar_dispatch::DispatchPolicy;
use search_comparisons::service::ExperimentRequest;
use search_comparisons::{AppConfig, ComparisonService, Credentials, FieldBoost};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Compare academic search backends and evaluate boost experiments.
#[derive(Parser)]
#[command(name = "search-compare", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// ADS API token.
    #[arg(long, env = "ADS_API_TOKEN", hide_env_values = true, global = true)]
    ads_token: Option<String>,

    /// Semantic Scholar API key (optional).
    #[arg(long, env = "SEMANTIC_SCHOLAR_API_KEY", hide_env_values = true, global = true)]
    semantic_scholar_key: Option<String>,

    /// Quepid API key.
    #[arg(long, env = "QUEPID_API_KEY", hide_env_values = true, global = true)]
    quepid_api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Dispatch a query across the configured backends.
    Search {
        query: String,
        /// Query every backend concurrently and merge, instead of falling back in priority order.
        #[arg(long)]
        parallel: bool,
    },

    /// Load a Quepid case.
    Case {
        case_id: u64,
        /// Print document titles per query.
        #[arg(long, conflicts_with = "flat_titles")]
        titles: bool,
        /// Print one doc_id -> title map across all queries.
        #[arg(long)]
        flat_titles: bool,
    },

    /// Score a search against a case, optionally with a citation/recency boost.
    Evaluate {
        case_id: u64,
        query: String,
        #[arg(long, default_value_t = 0.0)]
        citation_weight: f64,
        #[arg(long, default_value_t = 0.0)]
        recency_weight: f64,
        #[arg(long, default_value_t = 2.0)]
        max_boost: f64,
        /// Document type weight as `type=weight`; repeatable.
        #[arg(long = "doctype-boost", value_name = "TYPE=WEIGHT", value_parser = parse_doctype_boost)]
        doctype_boosts: Vec<(String, f64)>,
        #[arg(long)]
        parallel: bool,
    },

    /// Query every backend and compare their rankings.
    Compare { query: String },

    /// Write the default configuration to the config path.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("search_comparisons=info,scholar_dispatch=info")
        }))
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);

    if let Command::InitConfig { force } = cli.command {
        return init_config(&config_path, force);
    }

    let config = AppConfig::load_or_default(&config_path)?;
    let credentials = Credentials {
        ads_token: cli.ads_token,
        semantic_scholar_key: cli.semantic_scholar_key,
        quepid_api_key: cli.quepid_api_key,
    };
    let service = ComparisonService::from_config(&config, credentials)?;

    match cli.command {
        Command::Search { query, parallel } => {
            let result = service.search(&query, policy(parallel)).await?;
            print_json(&result)
        }
        Command::Case {
            case_id,
            titles,
            flat_titles,
        } => {
            if titles || flat_titles {
                let views = service.titles(case_id).await?;
                if flat_titles {
                    print_json(&views.flat)
                } else {
                    print_json(&views.by_query)
                }
            } else {
                print_json(&service.load_case(case_id).await?)
            }
        }
        Command::Evaluate {
            case_id,
            query,
            citation_weight,
            recency_weight,
            max_boost,
            doctype_boosts,
            parallel,
        } => {
            let boosted = citation_weight > 0.0 || recency_weight > 0.0 || !doctype_boosts.is_empty();
            let boost = boosted.then(|| {
                doctype_boosts.iter().fold(
                    FieldBoost::current()
                        .with_citation_weight(citation_weight)
                        .with_recency_weight(recency_weight)
                        .with_max_boost(max_boost),
                    |boost, (doctype, weight)| boost.with_doctype_weight(doctype, *weight),
                )
            });
            let report = service
                .run_experiment(&ExperimentRequest {
                    case_id,
                    query,
                    policy: policy(parallel),
                    boost,
                })
                .await?;
            print_json(&report)
        }
        Command::Compare { query } => print_json(&service.compare(&query).await?),
        Command::InitConfig { .. } => Ok(()),
    }
}

fn policy(parallel: bool) -> DispatchPolicy {
    if parallel {
        DispatchPolicy::parallel()
    } else {
        DispatchPolicy::sequential()
    }
}

fn parse_doctype_boost(arg: &str) -> Result<(String, f64), String> {
    let (doctype, weight) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=WEIGHT, got {arg:?}"))?;
    let doctype = doctype.trim();
    if doctype.is_empty() {
        return Err("document type must not be empty".into());
    }
    let weight = weight
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid weight {weight:?}: {e}"))?;
    Ok((doctype.to_owned(), weight))
}

fn init_config(path: &std::path::Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    AppConfig::default().save_to_file(path)?;
    tracing::info!(path = %path.display(), "wrote default configuration");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctype_boost_parses_pairs() {
        assert_eq!(
            parse_doctype_boost("review=0.5"),
            Ok(("review".to_owned(), 0.5))
        );
        assert!(parse_doctype_boost("review").is_err());
        assert!(parse_doctype_boost("=0.5").is_err());
        assert!(parse_doctype_boost("review=lots").is_err());
    }

    #[test]
    fn doctype_boost_flag_repeats() {
        let cli = Cli::try_parse_from([
            "search-compare",
            "evaluate",
            "7",
            "dark matter",
            "--doctype-boost",
            "review=0.5",
            "--doctype-boost",
            "article=0.1",
        ])
        .expect("parse");
        match cli.command {
            Command::Evaluate { doctype_boosts, .. } => assert_eq!(doctype_boosts.len(), 2),
            _ => panic!("expected evaluate"),
        }
    }
}
