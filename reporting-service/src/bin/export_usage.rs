use std::{env, path::PathBuf};

use anyhow::{bail, Result};
use reporting_service::{
    config::AppConfig,
    export::{export_window, ExportFormat},
    observability, sources,
    window::{ReportType, Timeframe, Window},
};
use time::OffsetDateTime;

const USAGE: &str = "usage: export_usage <usage|report> <window> <csv|pdf> [output_dir]";

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        bail!(USAGE);
    }

    let window: Window = match args[1].as_str() {
        "usage" => args[2].parse::<Timeframe>()?.into(),
        "report" => args[2].parse::<ReportType>()?.into(),
        other => bail!("unknown export kind '{other}'; {USAGE}"),
    };
    let format: ExportFormat = args[3].parse()?;
    let output_dir = args.get(4).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    // Point REPORTING_CONFIG at the deployment config to export live data.
    let cfg = AppConfig::load()?;
    let source = sources::from_config(&cfg)?;
    let readings = source.readings().await;

    let file = export_window(
        &readings,
        window,
        format,
        OffsetDateTime::now_utc(),
        cfg.report.offset()?,
        &cfg.report.currency(),
    )?;
    let path = file.write_to(&output_dir).await?;

    tracing::info!(path = %path.display(), readings = readings.len(), "export written");
    Ok(())
}
