//! Food count and food flow pipelines.

use crate::analysis::{pca_food_counts, PcaOptions, PcaResult};
use crate::count::{base_counts, rollup};
use crate::data::{
    read_group_mapping, FlowEdge, FlowNode, FoodCountTable, FoodFlowTable, NetworkTable, Ontology,
    ProportionTable, SampleMetadata, WideFoodCounts, ONTOLOGY_LEVELS,
};
use crate::error::{GfopError, Result};
use crate::filter::validate_groups;
use crate::flow::derive_flows;
use std::path::Path;
use std::sync::Arc;

/// Builder for [`FoodCounts`].
#[derive(Debug, Clone)]
pub struct FoodCountsBuilder {
    sample_groups: Vec<String>,
    reference_groups: Vec<String>,
    levels: usize,
}

impl Default for FoodCountsBuilder {
    fn default() -> Self {
        Self {
            sample_groups: Vec::new(),
            reference_groups: Vec::new(),
            levels: ONTOLOGY_LEVELS,
        }
    }
}

impl FoodCountsBuilder {
    /// Create a builder rolling up all six levels.
    pub fn new() -> Self {
        Self::default()
    }

    /// GNPS groups holding the study samples.
    pub fn sample_groups<S: AsRef<str>>(mut self, groups: &[S]) -> Self {
        self.sample_groups = groups.iter().map(|g| g.as_ref().to_string()).collect();
        self
    }

    /// GNPS groups holding the reference foods.
    pub fn reference_groups<S: AsRef<str>>(mut self, groups: &[S]) -> Self {
        self.reference_groups = groups.iter().map(|g| g.as_ref().to_string()).collect();
        self
    }

    /// Number of ontology levels to roll up (`0..=6`).
    pub fn levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    /// Build from a network TSV on disk.
    pub fn build_from_path<P: AsRef<Path>>(
        &self,
        network_path: P,
        ontology: Arc<Ontology>,
    ) -> Result<FoodCounts> {
        let network = NetworkTable::from_tsv(network_path)?;
        self.build(network, ontology)
    }

    /// Validate the groups and compute every level eagerly.
    pub fn build(&self, network: NetworkTable, ontology: Arc<Ontology>) -> Result<FoodCounts> {
        if self.levels > ONTOLOGY_LEVELS {
            return Err(GfopError::InvalidParameter(format!(
                "levels must be within 0..={}, got {}",
                ONTOLOGY_LEVELS, self.levels
            )));
        }
        if self.sample_groups.is_empty() || self.reference_groups.is_empty() {
            return Err(GfopError::InvalidParameter(
                "Both sample and reference groups are required".to_string(),
            ));
        }
        validate_groups(&network, &self.sample_groups)?;
        validate_groups(&network, &self.reference_groups)?;

        let sample_metadata = SampleMetadata::from_network(&network, &self.sample_groups);
        let level0 = base_counts(
            &network,
            &sample_metadata,
            &ontology,
            &self.sample_groups,
            &self.reference_groups,
        )?;
        let higher = rollup(&level0, &ontology, self.levels)?;
        let counts = FoodCountTable::assemble(
            std::iter::once(level0.to_rows()).chain(higher),
            &sample_metadata,
        );

        log::info!(
            "Food counts for {} samples: {} level-0 pairs, {} rows over levels 0..={}",
            sample_metadata.n_samples(),
            level0.len(),
            counts.len(),
            self.levels
        );

        Ok(FoodCounts {
            network,
            ontology,
            sample_metadata,
            counts,
            sample_groups: self.sample_groups.clone(),
            reference_groups: self.reference_groups.clone(),
            levels: self.levels,
        })
    }
}

/// Hierarchical food counts for one study design.
///
/// All levels are computed at construction; afterwards only the group
/// labels can change, through [`FoodCounts::update_groups`].
#[derive(Debug, Clone)]
pub struct FoodCounts {
    network: NetworkTable,
    ontology: Arc<Ontology>,
    sample_metadata: SampleMetadata,
    counts: FoodCountTable,
    sample_groups: Vec<String>,
    reference_groups: Vec<String>,
    levels: usize,
}

impl FoodCounts {
    /// Start configuring a food count pipeline.
    pub fn builder() -> FoodCountsBuilder {
        FoodCountsBuilder::new()
    }

    /// The assembled long table.
    pub fn counts(&self) -> &FoodCountTable {
        &self.counts
    }

    /// Sample filename → group mapping.
    pub fn sample_metadata(&self) -> &SampleMetadata {
        &self.sample_metadata
    }

    /// The network the counts were computed from.
    pub fn network(&self) -> &NetworkTable {
        &self.network
    }

    /// The shared ontology store.
    pub fn ontology(&self) -> &Arc<Ontology> {
        &self.ontology
    }

    pub fn sample_groups(&self) -> &[String] {
        &self.sample_groups
    }

    pub fn reference_groups(&self) -> &[String] {
        &self.reference_groups
    }

    /// Highest level rolled up.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Rows at `level`, optionally restricted to some food types.
    pub fn filter<S: AsRef<str>>(&self, food_types: Option<&[S]>, level: u8) -> FoodCountTable {
        self.counts.filter(food_types, level)
    }

    /// One level in wide format; `level` is required since every level is present.
    pub fn pivot_wide(&self, level: u8) -> Result<WideFoodCounts> {
        self.counts.pivot_wide(Some(level))
    }

    /// Per-filename proportions at `level`.
    pub fn proportions(&self, level: u8) -> Result<ProportionTable> {
        self.counts.proportions(Some(level))
    }

    /// Ordinate one level.
    pub fn pca(&self, options: &PcaOptions) -> Result<PcaResult> {
        pca_food_counts(&self.counts, options)
    }

    /// Override groups from a CSV/TSV metadata file.
    ///
    /// Both the long table and the sample metadata are updated. Returns the
    /// number of overrides read. Nothing changes when the file is rejected.
    pub fn update_groups<P: AsRef<Path>>(&mut self, path: P, merge_column: &str) -> Result<usize> {
        let mapping = read_group_mapping(path, merge_column)?;
        self.counts.apply_group_mapping(&mapping);
        self.sample_metadata.apply_mapping(&mapping);
        log::info!(
            "Updated groups from column '{}' ({} filenames)",
            merge_column,
            mapping.len()
        );
        Ok(mapping.len())
    }

    /// Write the long table as TSV.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.counts.to_tsv(path)
    }
}

/// Food flows between adjacent ontology levels.
#[derive(Debug, Clone)]
pub struct FoodFlows {
    flows: FoodFlowTable,
    groups_included: Vec<String>,
    max_level: usize,
}

impl FoodFlows {
    /// Validate the groups and derive flows up to `max_level`.
    pub fn new<S: AsRef<str>>(
        network: &NetworkTable,
        ontology: &Ontology,
        groups_included: &[S],
        max_level: usize,
    ) -> Result<Self> {
        validate_groups(network, groups_included)?;
        let flows = derive_flows(network, ontology, groups_included, max_level)?;
        Ok(Self {
            flows,
            groups_included: groups_included
                .iter()
                .map(|g| g.as_ref().to_string())
                .collect(),
            max_level,
        })
    }

    /// Load the network from disk, then derive flows.
    pub fn from_path<P: AsRef<Path>, S: AsRef<str>>(
        network_path: P,
        ontology: &Ontology,
        groups_included: &[S],
        max_level: usize,
    ) -> Result<Self> {
        let network = NetworkTable::from_tsv(network_path)?;
        Self::new(&network, ontology, groups_included, max_level)
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.flows.edges
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.flows.nodes
    }

    pub fn table(&self) -> &FoodFlowTable {
        &self.flows
    }

    pub fn groups_included(&self) -> &[String] {
        &self.groups_included
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Write edges and nodes as two TSV files.
    pub fn to_tsv<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        edges_path: P,
        nodes_path: Q,
    ) -> Result<()> {
        self.flows.to_tsv(edges_path, nodes_path)
    }
}
