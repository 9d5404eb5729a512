//! Roll level-0 counts up the ontology with a water noise floor.

use super::level0::Level0Counts;
use crate::data::{ancestor_at, FoodCountRow, FoodMatrix, Ontology, ONTOLOGY_LEVELS, WATER};
use crate::error::{GfopError, Result};
use std::collections::BTreeSet;

/// Pivot level-0 counts onto the level-`level` ancestor categories.
///
/// Each leaf contributes its count once per distinct ancestor chain; leaves
/// without an ontology entry or without a category at this level add nothing.
/// Every level-0 filename keeps a row, zero-filled when none of its leaves
/// reach this level.
pub fn level_matrix(level0: &Level0Counts, ontology: &Ontology, level: usize) -> FoodMatrix {
    let mut triplets: Vec<(&str, &str, u64)> = level0
        .counts()
        .iter()
        .flat_map(|c| {
            ontology
                .chains_for_leaf(&c.sample_name)
                .iter()
                .filter_map(move |chain| {
                    ancestor_at(chain, level).map(|cat| (c.filename.as_str(), cat, c.count))
                })
        })
        .collect();

    if let Some(&(_, category, _)) = triplets.first() {
        let filenames: BTreeSet<&str> =
            level0.counts().iter().map(|c| c.filename.as_str()).collect();
        triplets.extend(filenames.into_iter().map(|f| (f, category, 0)));
    }
    FoodMatrix::from_triplets(triplets)
}

/// Long-table rows for one ontology level.
///
/// When a `water` category exists at this level, a cell survives only if it
/// is strictly greater than the same filename's water count, and the water
/// column is dropped. Categories left with no signal are removed before the
/// matrix is melted, so surviving categories carry explicit zero rows.
pub fn rollup_level(
    level0: &Level0Counts,
    ontology: &Ontology,
    level: usize,
) -> Result<Vec<FoodCountRow>> {
    if level == 0 || level > ONTOLOGY_LEVELS {
        return Err(GfopError::InvalidParameter(format!(
            "Rollup level must be within 1..={}, got {}",
            ONTOLOGY_LEVELS, level
        )));
    }

    let mut matrix = level_matrix(level0, ontology, level);
    if let Some(floor) = matrix.suppress_below_blank(WATER)? {
        log::debug!(
            "Level {}: water floor applied to {} filenames",
            level,
            floor.len()
        );
    }
    let matrix = matrix.drop_empty_columns()?;

    let rows: Vec<FoodCountRow> = matrix
        .melt()
        .into_iter()
        .map(|(filename, food_type, count)| {
            FoodCountRow::new(filename, food_type, count, level as u8)
        })
        .collect();

    log::debug!(
        "Level {}: {} categories, {} rows",
        level,
        matrix.n_food_types(),
        rows.len()
    );
    Ok(rows)
}

/// Rows for every level in `1..=levels`, one vector per level.
///
/// `levels == 0` yields no rollup levels.
pub fn rollup(
    level0: &Level0Counts,
    ontology: &Ontology,
    levels: usize,
) -> Result<Vec<Vec<FoodCountRow>>> {
    if levels > ONTOLOGY_LEVELS {
        return Err(GfopError::InvalidParameter(format!(
            "At most {} ontology levels are available, got {}",
            ONTOLOGY_LEVELS, levels
        )));
    }
    (1..=levels)
        .map(|level| rollup_level(level0, ontology, level))
        .collect()
}
