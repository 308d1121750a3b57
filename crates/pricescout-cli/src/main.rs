mod export;
mod summary;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use pricescout_core::{load_queries, parse_max_price, Query, QuerySpec, SourceId};
use pricescout_scraper::{run_search, HttpFetcherProvider, ScraperConfig, SearchContext};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::export::ExportFormat;

#[derive(Debug, Parser)]
#[command(name = "pricescout")]
#[command(about = "Search Noon, Namshi and Amazon.ae and compare prices")]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["term", "single", "file"])
))]
struct Cli {
    /// Item to search for
    term: Option<String>,

    /// Single query as `term,max_price`
    #[arg(short, long)]
    single: Option<String>,

    /// Query list with one `term` or `term,max_price` per line
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Maximum price in the configured currency; overrides per-query budgets
    #[arg(short = 'p', long, value_parser = parse_max_price)]
    max_price: Option<Decimal>,

    /// Search Noon.com (combinable; no source flag means all sources)
    #[arg(long, alias = "noon-only")]
    noon: bool,

    /// Search Namshi.com
    #[arg(long, alias = "namshi-only")]
    namshi: bool,

    /// Search Amazon.ae
    #[arg(long, alias = "amazon-only")]
    amazon: bool,

    /// Run the fetcher headless
    #[arg(long, conflicts_with = "visible")]
    headless: bool,

    /// Run the fetcher with a visible window
    #[arg(long)]
    visible: bool,

    /// Output file name; the extension is added when missing
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export CSV instead of JSON
    #[arg(long)]
    csv: bool,
}

impl Cli {
    fn sources(&self) -> Vec<SourceId> {
        let picked: Vec<SourceId> = [
            (self.noon, SourceId::Noon),
            (self.namshi, SourceId::Namshi),
            (self.amazon, SourceId::Amazon),
        ]
        .into_iter()
        .filter_map(|(enabled, source)| enabled.then_some(source))
        .collect();
        if picked.is_empty() {
            SourceId::ALL.to_vec()
        } else {
            picked
        }
    }

    fn headless_override(&self) -> Option<bool> {
        if self.visible {
            Some(false)
        } else if self.headless {
            Some(true)
        } else {
            None
        }
    }

    fn format(&self) -> ExportFormat {
        if self.csv {
            ExportFormat::Csv
        } else {
            ExportFormat::Json
        }
    }
}

/// Resolve and validate every query before any network activity.
fn build_queries(cli: &Cli) -> anyhow::Result<Vec<Query>> {
    let specs = if let Some(term) = &cli.term {
        vec![QuerySpec {
            term: term.clone(),
            max_price: None,
        }]
    } else if let Some(single) = &cli.single {
        vec![QuerySpec::parse(single)?]
    } else if let Some(path) = &cli.file {
        let specs = load_queries(path)?;
        if specs.is_empty() {
            anyhow::bail!("query file {} contains no queries", path.display());
        }
        specs
    } else {
        anyhow::bail!("no query given; pass a term, --single, or --file");
    };

    let sources = cli.sources();
    specs
        .into_iter()
        .map(|spec| {
            let spec = QuerySpec {
                max_price: cli.max_price.or(spec.max_price),
                ..spec
            };
            let term = spec.term.clone();
            spec.into_query(sources.iter().copied())
                .map_err(|e| anyhow::anyhow!("invalid query '{term}': {e}"))
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = pricescout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let queries = build_queries(&cli)?;

    let mut scraper_config = ScraperConfig::from_app_config(&config);
    if let Some(headless) = cli.headless_override() {
        scraper_config.headless = headless;
    }
    let inter_query_delay = Duration::from_millis(config.inter_query_delay_ms);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c, cancelling search");
            on_signal.cancel();
        }
    });

    let provider = HttpFetcherProvider::default();
    let ctx = SearchContext {
        provider: &provider,
        config: &scraper_config,
        cancel: &cancel,
    };
    let format = cli.format();
    let batch = queries.len() > 1;

    for (idx, query) in queries.iter().enumerate() {
        if idx > 0 {
            tokio::select! {
                () = tokio::time::sleep(inter_query_delay) => {}
                () = cancel.cancelled() => anyhow::bail!("search cancelled"),
            }
        }

        let report = run_search(query, &ctx).await?;
        print!("{}", summary::render(&report));

        let path = export::output_path(cli.output.as_deref(), query.term(), format, batch);
        export::write_report(&report, &path, format)?;
        println!("saved results to {}", path.display());
    }

    Ok(())
}
