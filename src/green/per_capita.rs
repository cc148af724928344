use crate::types::GreenRecord;

/// Green area per inhabitant. Undefined when either input is missing or nobody lives there.
#[inline]
pub fn per_capita(green_area_m2: Option<f64>, population: Option<f64>) -> Option<f64> {
    match (green_area_m2, population) {
        (Some(area), Some(people)) if people > 0.0 => Some(area / people),
        _ => None,
    }
}

/// Fill `green_area_per_capita_m2` on every record.
pub fn apply_per_capita(records: Vec<GreenRecord>) -> Vec<GreenRecord> {
    records.into_iter()
        .map(|record| GreenRecord {
            green_area_per_capita_m2: per_capita(record.green_area_m2, record.population),
            ..record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RegionId;

    #[test]
    fn divides_area_by_population() {
        assert_eq!(per_capita(Some(5000.0), Some(250.0)), Some(20.0));
    }

    #[test]
    fn zero_population_is_undefined() {
        assert_eq!(per_capita(Some(5000.0), Some(0.0)), None);
    }

    #[test]
    fn missing_inputs_are_undefined() {
        assert_eq!(per_capita(None, Some(10.0)), None);
        assert_eq!(per_capita(Some(10.0), None), None);
    }

    #[test]
    fn fills_every_record() {
        let record = GreenRecord {
            region_id: RegionId(1),
            name: "one".to_string(),
            area_imputed: 10_000.0,
            green_area_m2: Some(1200.0),
            green_ratio: Some(0.12),
            population: Some(400.0),
            green_area_per_capita_m2: None,
        };
        let filled = apply_per_capita(vec![record]);
        assert_eq!(filled[0].green_area_per_capita_m2, Some(3.0));
    }
}
