use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReader, DataType}};
use tracing::{info, warn};

use crate::{
    config::{SourceFields, SourceFixups},
    green::apply_population_fixups,
    types::{PopulationRecord, RegionId},
};

/// Reads a CSV file from `path` into a Polars DataFrame.
fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv] Failed to open CSV file: {}", path.display()))?;
    CsvReader::new(file)
        .finish()
        .with_context(|| format!("[io::csv] Failed to read CSV from {:?}", path))
}

/// Read the population table and apply the configured fixups.
///
/// Rows with a null population, a negative population or no usable id are dropped with a
/// warning. A null id is recovered when the row's name has a remap.
pub fn read_population(path: &Path, fields: &SourceFields, fixups: &SourceFixups) -> Result<Vec<PopulationRecord>> {
    let df = read_csv(path)?;

    let column = |name: &str, dtype: DataType| df.column(name)
        .with_context(|| format!("[io::csv] Missing column '{name}' in {}", path.display()))?
        .cast(&dtype)
        .with_context(|| format!("[io::csv] Column '{name}' in {} is not {dtype}", path.display()));

    let ids = column(&fields.population_id, DataType::Int64)?;
    let names = column(&fields.population_name, DataType::String)?;
    let population = column(&fields.population, DataType::Float64)?;

    let mut rows = Vec::with_capacity(df.height());
    for (row, ((id, name), people)) in ids.i64()?.into_iter()
        .zip(names.str()?.into_iter())
        .zip(population.f64()?.into_iter())
        .enumerate()
    {
        let name = name.unwrap_or_default();
        let Some(region_id) = id.map(RegionId).or_else(|| fixups.population_id_for(name)) else {
            warn!(row, name, "[io::csv] population row has no id, skipping");
            continue;
        };
        let Some(people) = people.filter(|people| people.is_finite()) else {
            warn!(row, region_id = %region_id, "[io::csv] population row has no value, skipping");
            continue;
        };
        if people < 0.0 {
            warn!(row, region_id = %region_id, people, "[io::csv] negative population, skipping");
            continue;
        }

        rows.push(PopulationRecord { region_id, name: name.to_string(), population: people });
    }

    let rows = apply_population_fixups(rows, fixups);
    info!(count = rows.len(), path = %path.display(), "[io::csv] loaded population");
    Ok(rows)
}
