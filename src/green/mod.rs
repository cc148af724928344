mod per_capita;
mod population;
mod ratio;

pub use per_capita::{apply_per_capita, per_capita};
pub use population::{apply_population_fixups, join_population};
pub use ratio::{compute_green_ratios, GreenBatch, SkippedRegion};
