use std::path::PathBuf;

/// Livability indicators CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "livability", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON config file; missing keys take their defaults
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Green ratio, population join and green area per capita (forbids stdout)
    Green(GreenArgs),

    /// Walk-graph transit accessibility per region (forbids stdout)
    Access(AccessArgs),

    /// Look up one region by id or coordinate, printed as JSON
    Query(QueryArgs),

    /// Composite index as a GeoJSON FeatureCollection (forbids stdout)
    Icvu(IcvuArgs),
}

#[derive(clap::Args, Debug)]
pub struct GreenArgs {
    /// Region boundaries (GeoJSON, lon/lat)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub regions: PathBuf,

    /// Green-space footprints (GeoJSON, lon/lat)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub green: PathBuf,

    /// Population table (CSV)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub population: PathBuf,

    /// Output file, defaults to "./green.geojson"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct AccessArgs {
    /// Region boundaries (GeoJSON, lon/lat)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub regions: PathBuf,

    /// Walkable street network (GeoJSON lines, lon/lat)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub walk: PathBuf,

    /// Bus GTFS feed (directory or zip)
    #[arg(long, value_hint = clap::ValueHint::AnyPath)]
    pub bus_gtfs: PathBuf,

    /// Rail GTFS feed (directory or zip)
    #[arg(long, value_hint = clap::ValueHint::AnyPath)]
    pub rail_gtfs: PathBuf,

    /// Output file, defaults to "./access.geojson"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Coverage threshold in meters (overrides the config)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Average walking speed in m/s (overrides the config)
    #[arg(long)]
    pub speed: Option<f64>,

    /// Score regions in parallel
    #[arg(long)]
    pub parallel: bool,
}

#[derive(clap::Args, Debug)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["id", "lon"])))]
pub struct QueryArgs {
    /// Output of the `green` command
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub green: PathBuf,

    /// Output of the `access` command
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub access: PathBuf,

    /// Region id
    #[arg(long)]
    pub id: Option<i64>,

    /// Longitude of the point to resolve
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Latitude of the point to resolve
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct IcvuArgs {
    /// Output of the `green` command
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub green: PathBuf,

    /// Output of the `access` command
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub access: PathBuf,

    /// Weight of the green ratio (overrides the config)
    #[arg(long, allow_negative_numbers = true)]
    pub alpha: Option<f64>,

    /// Weight of the accessibility share (overrides the config)
    #[arg(long, allow_negative_numbers = true)]
    pub beta: Option<f64>,

    /// Output file, defaults to "./icvu.geojson"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
