use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use foundation::Chamber;
use heatmap::{DrilldownSession, HeatmapConfig};
use layers::{legend, ScoreTable};
use scene::{OverlayMetric, Theme};
use streaming::{DocumentSource, FilesystemSource, HttpSource};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Legislative heat map drill-down")]
struct Args {
    /// JSON config file (falls back to $HEATMAP_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drill down to a region and print the resulting view as JSON
    Show {
        /// Serve dataset URLs from this directory instead of over HTTP
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// JSON array of score records
        #[arg(long)]
        scores: Option<PathBuf>,

        /// State name, postal abbreviation, or FIPS code
        #[arg(long)]
        state: Option<String>,

        /// County FIPS code (requires --state)
        #[arg(long)]
        county: Option<String>,

        /// District number in the active chamber (requires --state)
        #[arg(long)]
        district: Option<String>,

        /// house or senate
        #[arg(long)]
        chamber: Option<String>,

        /// volume, sentiment, momentum, or legislative
        #[arg(long)]
        overlay: Option<String>,

        /// light or dark
        #[arg(long)]
        theme: Option<String>,

        /// Add the selected region to the compare set
        #[arg(long)]
        compare: bool,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Print the color legend for a theme
    Legend {
        #[arg(long, default_value = "light")]
        theme: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config_path = args
        .config
        .or_else(|| env::var("HEATMAP_CONFIG").ok().map(PathBuf::from));
    let mut config = match &config_path {
        Some(path) => HeatmapConfig::load(path)?,
        None => HeatmapConfig::default(),
    };

    match args.command {
        Command::Legend { theme } => {
            let theme = Theme::parse(&theme).ok_or_else(|| format!("unknown theme: {theme}"))?;
            println!("{}", serde_json::to_string_pretty(&legend(theme))?);
        }
        Command::Show {
            data_root,
            scores,
            state,
            county,
            district,
            chamber,
            overlay,
            theme,
            compare,
            pretty,
        } => {
            if let Some(root) = data_root {
                config.data_root = Some(root);
            }
            if let Some(path) = scores {
                config.scores = Some(path);
            }
            if let Some(theme) = theme {
                config.theme =
                    Theme::parse(&theme).ok_or_else(|| format!("unknown theme: {theme}"))?;
            }
            if let Some(overlay) = overlay {
                config.overlay = OverlayMetric::parse(&overlay)
                    .ok_or_else(|| format!("unknown overlay: {overlay}"))?;
            }
            if let Some(chamber) = chamber {
                config.chamber = Chamber::parse(&chamber)
                    .ok_or_else(|| format!("unknown chamber: {chamber}"))?;
            }

            let source: Arc<dyn DocumentSource> = match &config.data_root {
                Some(root) => {
                    info!(root = %root.display(), "serving datasets from disk");
                    Arc::new(FilesystemSource::new(root))
                }
                None => Arc::new(HttpSource::new()),
            };
            let score_table = match &config.scores {
                Some(path) => {
                    let bytes = tokio::fs::read(path)
                        .await
                        .map_err(|e| format!("read {}: {e}", path.display()))?;
                    ScoreTable::from_json_slice(&bytes)
                        .map_err(|e| format!("parse {}: {e}", path.display()))?
                }
                None => ScoreTable::new(),
            };

            let mut session = DrilldownSession::new(source, &config, score_table)?;
            session.start().await;

            if let Some(state) = state {
                if let Err(rejection) = session.select_state(&state).await {
                    warn!(%rejection, "state selection refused");
                }
            }
            if let Some(county) = county {
                if let Err(rejection) = session.select_county(&county).await {
                    warn!(%rejection, "county selection refused");
                }
            }
            if let Some(district) = district {
                if let Err(rejection) = session.select_district(&district).await {
                    warn!(%rejection, "district selection refused");
                }
            }
            if compare {
                session.set_compare_mode(true).await?;
                if let Err(rejection) = session.add_current_to_compare().await {
                    warn!(%rejection, "compare refused");
                }
            }
            session.settle();

            let report = session.report();
            let out = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{out}");
        }
    }

    Ok(())
}
