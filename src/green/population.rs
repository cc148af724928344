use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::{
    config::SourceFixups,
    error::{LivabilityError, Result},
    types::{GreenRecord, PopulationRecord, RegionId},
};

/// Apply the known name-based id corrections, then inject rows whose id is still absent.
pub fn apply_population_fixups(mut rows: Vec<PopulationRecord>, fixups: &SourceFixups) -> Vec<PopulationRecord> {
    for row in rows.iter_mut() {
        if let Some(id) = fixups.population_id_for(&row.name) {
            debug!(name = %row.name, from = %row.region_id, to = %id, "[population] remapping id");
            row.region_id = id;
        }
    }

    for injected in &fixups.injected_population {
        if rows.iter().any(|row| row.region_id == injected.id) { continue }
        debug!(id = %injected.id, name = %injected.name, "[population] injecting missing row");
        rows.push(PopulationRecord {
            region_id: injected.id,
            name: injected.name.clone(),
            population: injected.population,
        });
    }

    rows
}

/// Attach `population` to every green record by region id.
///
/// The join is strict: the two id sets must be equal, otherwise the whole batch is rejected with
/// `SchemaMismatch` listing the ids on each side that have no partner. Duplicate population ids
/// keep their first row.
pub fn join_population(records: Vec<GreenRecord>, population: &[PopulationRecord]) -> Result<Vec<GreenRecord>> {
    let mut by_id: BTreeMap<RegionId, f64> = BTreeMap::new();
    for row in population {
        if by_id.contains_key(&row.region_id) {
            warn!(region_id = %row.region_id, name = %row.name, "[population] duplicate id, keeping the first row");
            continue;
        }
        by_id.insert(row.region_id, row.population);
    }

    let region_ids = records.iter().map(|record| record.region_id).collect::<BTreeSet<_>>();
    let only_regions = region_ids.iter().filter(|id| !by_id.contains_key(id)).copied().collect::<Vec<_>>();
    let only_population = by_id.keys().filter(|id| !region_ids.contains(id)).copied().collect::<Vec<_>>();

    if !only_regions.is_empty() || !only_population.is_empty() {
        return Err(LivabilityError::SchemaMismatch { only_regions, only_population });
    }

    Ok(records.into_iter()
        .map(|record| GreenRecord { population: by_id.get(&record.region_id).copied(), ..record })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InjectedPopulation, NameRemap};

    fn green(id: i64) -> GreenRecord {
        GreenRecord {
            region_id: RegionId(id),
            name: format!("region {id}"),
            area_imputed: 1000.0,
            green_area_m2: Some(100.0),
            green_ratio: Some(0.1),
            population: None,
            green_area_per_capita_m2: None,
        }
    }

    fn row(id: i64, name: &str, population: f64) -> PopulationRecord {
        PopulationRecord { region_id: RegionId(id), name: name.to_string(), population }
    }

    #[test]
    fn equal_key_sets_join_every_row() {
        let records = vec![green(1), green(2), green(3)];
        let population = [row(3, "c", 30.0), row(1, "a", 10.0), row(2, "b", 20.0)];

        let joined = join_population(records, &population).unwrap();
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.iter().map(|r| r.population).collect::<Vec<_>>(), [Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn missing_population_row_is_a_schema_mismatch() {
        let records = vec![green(1), green(2), green(3)];
        let population = [row(1, "a", 10.0), row(2, "b", 20.0)];

        let err = join_population(records, &population).unwrap_err();
        assert_eq!(err, LivabilityError::SchemaMismatch { only_regions: vec![RegionId(3)], only_population: vec![] });
    }

    #[test]
    fn extra_population_row_is_a_schema_mismatch() {
        let population = [row(1, "a", 10.0), row(9, "z", 5.0), row(7, "y", 5.0)];

        let err = join_population(vec![green(1)], &population).unwrap_err();
        assert_eq!(err, LivabilityError::SchemaMismatch {
            only_regions: vec![],
            only_population: vec![RegionId(7), RegionId(9)],
        });
    }

    #[test]
    fn duplicate_ids_keep_the_first_row() {
        let population = [row(1, "a", 10.0), row(1, "a again", 99.0)];
        let joined = join_population(vec![green(1)], &population).unwrap();
        assert_eq!(joined[0].population, Some(10.0));
    }

    #[test]
    fn fixups_remap_then_inject() {
        let fixups = SourceFixups {
            region_remaps: vec![],
            population_remaps: vec![NameRemap { name: "MAUELLA".to_string(), id: RegionId(1234) }],
            injected_population: vec![
                InjectedPopulation { id: RegionId(175), name: "RAFALELL-VISTABELLA".to_string(), population: 59.0 },
                InjectedPopulation { id: RegionId(1), name: "already there".to_string(), population: 1.0 },
            ],
        };
        let rows = apply_population_fixups(vec![row(1, "a", 10.0), row(0, "MAUELLA", 42.0)], &fixups);

        assert_eq!(rows, vec![row(1, "a", 10.0), row(1234, "MAUELLA", 42.0), row(175, "RAFALELL-VISTABELLA", 59.0)]);
    }
}
