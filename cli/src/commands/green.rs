use anyhow::{Context, Result};
use livability::{io, projector_for, run_green_pipeline};
use tracing::{info, warn};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::GreenArgs) -> Result<()> {
    let config = super::load_config(cli)?;
    let out_path = super::output_path(&args.output, "./green.geojson")?;

    info!("[green] loading regions from {}", args.regions.display());
    let regions = io::read_regions(&args.regions, &config.fields, &config.fixups)?;
    let green = io::read_green_spaces(&args.green)?;
    let population = io::read_population(&args.population, &config.fields, &config.fixups)?;

    let projector = projector_for(&config, &regions)?;
    info!("[green] computing indicators in {}", projector.metric_def());
    let (records, report) = run_green_pipeline(&regions, &green, population, &projector)
        .context("[green] Batch failed")?;

    for skip in &report.skipped {
        warn!("[green] skipped region {} ({}): {}", skip.region_id, skip.name, skip.error);
    }

    info!("[green] writing {} records to {}", records.len(), out_path.display());
    io::write_records(&out_path, &records, &regions)
}
