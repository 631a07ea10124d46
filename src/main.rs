use anyhow::{Context, bail};
use chrono::Local;
use clap::Parser;
use crm_lens::{
    ActivityWindow, AmountRange, CrmConfig, Dashboard, FilterField, FilterSpec, Narrator, RequestKind,
    export, load_csv_file,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// crm-lens - filter a CRM customer dataset and ask questions about the result
#[derive(Parser, Debug)]
#[command(name = "crm-lens")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV dataset to load (overrides dataset.path)
    #[arg(short, long, env = "CRM_LENS_DATA")]
    data: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, default_value = "crm_lens.toml")]
    config: PathBuf,

    #[arg(long)]
    age_group: Option<String>,

    #[arg(long)]
    region: Option<String>,

    /// Repeat to select several values
    #[arg(long)]
    gender: Vec<String>,

    #[arg(long)]
    language: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    channel: Option<String>,

    #[arg(long)]
    segment: Option<String>,

    #[arg(long)]
    min_amount: Option<f64>,

    #[arg(long)]
    max_amount: Option<f64>,

    /// Only purchases within the last N days
    #[arg(long)]
    activity_days: Option<u32>,

    /// Filter as JSON, used instead of the individual filter flags
    #[arg(long, conflicts_with_all = ["age_group", "region", "gender", "language", "category", "channel", "segment", "min_amount", "max_amount", "activity_days"])]
    spec: Option<String>,

    /// Print the selectable values of every filter
    #[arg(long)]
    options: bool,

    /// Write the filtered records as JSON to this path
    #[arg(long)]
    export: Option<PathBuf>,

    /// Ask a question about the filtered customers
    #[arg(long)]
    ask: Option<String>,

    /// Ask for marketing recommendations for the filtered customers
    #[arg(long)]
    recommend: bool,
}

impl Args {
    fn filter_spec(&self) -> anyhow::Result<FilterSpec> {
        if let Some(json) = &self.spec {
            return serde_json::from_str(json).context("invalid --spec JSON");
        }
        let mut spec = FilterSpec::new();
        let singles = [
            (FilterField::AgeGroup, &self.age_group),
            (FilterField::Region, &self.region),
            (FilterField::Language, &self.language),
            (FilterField::Category, &self.category),
            (FilterField::Channel, &self.channel),
            (FilterField::Segment, &self.segment),
        ];
        for (field, value) in singles {
            if let Some(value) = value {
                spec.select(field, value.as_str());
            }
        }
        spec.set_any_of(FilterField::Gender, self.gender.iter().map(String::as_str));

        let defaults = AmountRange::default();
        let range = AmountRange::new(
            self.min_amount.unwrap_or(defaults.min()),
            self.max_amount.unwrap_or(defaults.max()),
        )?;
        spec.set_amount_range(range);

        if let Some(days) = self.activity_days {
            spec.set_activity(Some(ActivityWindow::new(days, Local::now().date_naive())?));
        }
        Ok(spec)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = CrmConfig::load_from_path(&args.config)?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(path) = args.data.clone().or_else(|| config.dataset.path.clone()) else {
        bail!("no dataset given: pass --data or set dataset.path");
    };
    let (store, report) = load_csv_file(&path, &config.ingest_options())
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(%report, path = %path.display(), "dataset ready");
    if !report.unknown_columns.is_empty() {
        tracing::debug!(columns = ?report.unknown_columns, "columns kept as extra fields");
    }

    let dashboard = Dashboard::with_store(store, Narrator::from_config(&config.narrative));

    if args.options {
        let snapshot = dashboard.snapshot();
        for field in FilterField::ALL {
            let values: Vec<&str> = snapshot.options().values(field).collect();
            println!("{}: {}", field.label(), values.join(", "));
        }
        return Ok(());
    }

    let snapshot = dashboard.apply_filter(args.filter_spec()?);
    println!("{}", snapshot.summary());
    let overlap = snapshot.overlap;
    println!(
        "Overlap: all {} / filtered {} / both {} ({:.1}%)",
        overlap.total,
        overlap.filtered,
        overlap.intersection,
        overlap.filtered_ratio() * 100.0
    );

    if let Some(path) = &args.export {
        export::write_json(snapshot.result.records(), path)?;
        println!("Exported {} records to {}", snapshot.result.len(), path.display());
    }

    if let Some(question) = &args.ask {
        if let Some(narrative) = dashboard.request_narrative(RequestKind::Search, Some(question)).await {
            println!("\n{}", narrative.text());
        }
    }
    if args.recommend {
        if let Some(narrative) = dashboard.request_narrative(RequestKind::Recommendation, None).await {
            println!("\n{}", narrative.text());
        }
    }
    Ok(())
}
