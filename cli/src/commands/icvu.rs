use anyhow::Result;
use livability::{io, Snapshot};
use tracing::info;

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::IcvuArgs) -> Result<()> {
    let config = super::load_config(cli)?;
    let out_path = super::output_path(&args.output, "./icvu.geojson")?;

    let mut weights = config.weights;
    if let Some(alpha) = args.alpha { weights.alpha = alpha }
    if let Some(beta) = args.beta { weights.beta = beta }

    let snapshot = Snapshot::from_files(&args.green, &args.access)?;
    info!("[icvu] alpha={} beta={} over {} regions", weights.alpha, weights.beta, snapshot.len());

    let collection = snapshot.composite_features(weights)?;
    io::write_feature_collection(&out_path, &collection)?;
    info!("[icvu] wrote {}", out_path.display());
    Ok(())
}
