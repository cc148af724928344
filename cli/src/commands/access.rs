use anyhow::Result;
use livability::{io, projector_for, run_access_pipeline, LineNetwork};
use tracing::{info, warn};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::AccessArgs) -> Result<()> {
    let mut config = super::load_config(cli)?;
    if let Some(threshold) = args.threshold { config.access.threshold_distance = threshold }
    if let Some(speed) = args.speed { config.access.average_walk_speed = speed }
    config.access.parallel |= args.parallel;
    let out_path = super::output_path(&args.output, "./access.geojson")?;

    info!("[access] loading regions from {}", args.regions.display());
    let regions = io::read_regions(&args.regions, &config.fields, &config.fixups)?;
    let stops = io::read_transit(&args.bus_gtfs, &args.rail_gtfs)?;

    let projector = projector_for(&config, &regions)?;
    info!("[access] loading walk network from {}", args.walk.display());
    let network = LineNetwork::new(projector.all_to_metric(&io::read_walk_lines(&args.walk)?)?);

    info!("[access] scoring {} regions against {} stops", regions.len(), stops.len());
    let (records, report) = run_access_pipeline(&regions, &stops, &network, &projector, &config)?;

    for skip in &report.skipped {
        warn!("[access] skipped region {} ({}): {}", skip.region_id, skip.name, skip.error);
    }

    info!("[access] writing {} records to {}", records.len(), out_path.display());
    io::write_records(&out_path, &records, &regions)
}
