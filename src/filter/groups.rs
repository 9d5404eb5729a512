//! Group validation and group-based cluster selection.

use crate::data::{Cluster, NetworkTable, GROUP_LABELS};
use crate::error::{GfopError, Result};
use std::collections::HashSet;

/// Check that every requested label occurs in the network's `DefaultGroups`.
///
/// # Errors
/// [`GfopError::InvalidGroups`] naming every unknown label, sorted.
pub fn validate_groups<S: AsRef<str>>(network: &NetworkTable, groups: &[S]) -> Result<()> {
    let valid = network.group_labels();
    let mut invalid: Vec<String> = groups
        .iter()
        .map(|g| g.as_ref())
        .filter(|g| !valid.contains(*g))
        .map(String::from)
        .collect();

    if invalid.is_empty() {
        return Ok(());
    }
    invalid.sort();
    invalid.dedup();
    Err(GfopError::InvalidGroups { groups: invalid })
}

/// GNPS labels not named in any of the given lists.
pub fn excluded_groups<S: AsRef<str>>(included: &[&[S]]) -> Vec<&'static str> {
    let named: HashSet<&str> = included
        .iter()
        .flat_map(|list| list.iter().map(|g| g.as_ref()))
        .collect();
    GROUP_LABELS
        .iter()
        .copied()
        .filter(|g| !named.contains(g))
        .collect()
}

/// Fail with [`GfopError::MissingColumn`] if a group has no numeric column.
fn require_columns<S: AsRef<str>>(network: &NetworkTable, groups: &[S]) -> Result<()> {
    let missing = groups
        .iter()
        .map(|g| g.as_ref())
        .find(|g| !network.has_group_column(g));
    match missing {
        Some(label) => Err(GfopError::MissingColumn(label.to_string())),
        None => Ok(()),
    }
}

/// Clusters usable for food counts.
///
/// A cluster qualifies when every sample group is present (> 0), at least
/// one reference group is present, and every other GNPS group is absent
/// (== 0).
pub fn select_for_counts<'a, S: AsRef<str>>(
    network: &'a NetworkTable,
    sample_groups: &[S],
    reference_groups: &[S],
) -> Result<Vec<&'a Cluster>> {
    require_columns(network, sample_groups)?;
    require_columns(network, reference_groups)?;
    let excluded = excluded_groups(&[sample_groups, reference_groups]);

    let selected: Vec<&Cluster> = network
        .clusters()
        .iter()
        .filter(|c| {
            sample_groups.iter().all(|g| c.group_count(g.as_ref()) > 0.0)
                && reference_groups.iter().any(|g| c.group_count(g.as_ref()) > 0.0)
                && excluded.iter().all(|g| c.group_count(g) == 0.0)
        })
        .collect();

    log::debug!(
        "{} of {} clusters pass the sample/reference group filter",
        selected.len(),
        network.n_clusters()
    );
    Ok(selected)
}

/// Clusters usable for food flows.
///
/// Every included group must be present and every other GNPS group absent.
pub fn select_for_flows<'a, S: AsRef<str>>(
    network: &'a NetworkTable,
    groups_included: &[S],
) -> Result<Vec<&'a Cluster>> {
    require_columns(network, groups_included)?;
    let excluded = excluded_groups(&[groups_included]);

    let selected: Vec<&Cluster> = network
        .clusters()
        .iter()
        .filter(|c| {
            groups_included.iter().all(|g| c.group_count(g.as_ref()) > 0.0)
                && excluded.iter().all(|g| c.group_count(g) == 0.0)
        })
        .collect();

    log::debug!(
        "{} of {} clusters pass the flow group filter",
        selected.len(),
        network.n_clusters()
    );
    Ok(selected)
}
