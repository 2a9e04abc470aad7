use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use geo::Rect;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    fields::Aliases,
    filter::{describe, filter_by_identifier, EmptyTerm, Filtered},
    normalize::{normalize_all, NormalizedPoint, Tally},
    source::Source,
};

mod fields;
mod filter;
mod geojson;
mod normalize;
mod numbers;
mod source;
mod utils;
mod utm;

#[derive(Debug, Parser)]
#[command(about = "Geolocate the institutions in a CSV for the map")]
struct Cli {
    /// CSV path or http(s) URL
    #[arg(long, global = true, default_value = source::DEFAULT_PATH)]
    csv: Source,

    /// YAML file overriding the column names tried for each field
    #[arg(long, global = true)]
    aliases: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Normalize every row and write a GeoJSON FeatureCollection
    Load {
        #[arg(long, default_value = "data/instituciones.geojson")]
        out: PathBuf,
    },
    /// Find institutions whose AMIE code contains a term
    Filter {
        #[arg(default_value = "")]
        term: String,
        #[arg(long, value_enum, default_value_t)]
        empty_term: EmptyTerm,
    },
    /// Print the effective column aliases
    Aliases,
}

fn load(source: &Source, aliases: &Aliases) -> Result<(Vec<NormalizedPoint>, Tally)> {
    let rows = source.read()?;
    info!(%source, rows = rows.len(), "read CSV");

    let (points, tally) = normalize_all(&rows, aliases);
    info!(
        "CSV processed. Total: {} | geocoded: {} | skipped: {}",
        tally.processed, tally.succeeded, tally.skipped
    );
    if tally.processed > 0 && tally.succeeded == 0 {
        warn!("no row had usable coordinates, check the column names with `aliases`");
    }

    Ok((points, tally))
}

fn bounds_line(rect: Rect) -> String {
    format!(
        "Bounds: {:.6},{:.6} {:.6},{:.6}",
        rect.min().x,
        rect.min().y,
        rect.max().x,
        rect.max().y
    )
}

fn filter_report(points: &[NormalizedPoint], term: &str, empty: EmptyTerm) -> Vec<String> {
    let result = filter_by_identifier(points, term, empty);
    match result {
        Filtered::Ignored => vec!["Empty search term, nothing to do".to_string()],
        Filtered::NoMatches => vec!["No matches found".to_string()],
        Filtered::All(_) | Filtered::Matches(_) => {
            let mut lines: Vec<_> = result.points().iter().map(|x| describe(x)).collect();
            lines.extend(geojson::view_bounds(result.points().iter().copied()).map(bounds_line));
            lines
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let aliases = match &cli.aliases {
        Some(path) => Aliases::load(path)?,
        None => Aliases::default(),
    };

    match cli.command {
        Command::Load { out } => {
            let (points, tally) = load(&cli.csv, &aliases)?;
            geojson::write(&out, &points)?;
            info!(path = %out.display(), features = points.len(), "wrote GeoJSON");
            println!("{tally}");
            if let Some(x) = geojson::view_bounds(&points) {
                println!("{}", bounds_line(x));
            }
        }
        Command::Filter { term, empty_term } => {
            let (points, _) = load(&cli.csv, &aliases)?;
            for line in filter_report(&points, &term, empty_term) {
                println!("{line}");
            }
        }
        Command::Aliases => {
            print!("{}", serde_yaml::to_string(&aliases)?);
        }
    }

    Ok(())
}
