//! YAML run configuration covering counts, flows and ordination.

use super::runner::{FoodCounts, FoodFlows};
use crate::analysis::PcaOptions;
use crate::data::{NetworkTable, Ontology, SampleTypes, ONTOLOGY_LEVELS};
use crate::error::{ensure_exists, GfopError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn default_levels() -> usize {
    ONTOLOGY_LEVELS
}

fn default_max_level() -> usize {
    ONTOLOGY_LEVELS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("gfop_output")
}

/// Flow section of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    pub groups_included: Vec<String>,
    #[serde(default = "default_max_level")]
    pub max_level: usize,
}

/// Group override section of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub path: PathBuf,
    pub merge_column: String,
}

/// Everything needed to reproduce one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub network: PathBuf,
    pub ontology: PathBuf,
    #[serde(default)]
    pub sample_types: SampleTypes,
    pub sample_groups: Vec<String>,
    pub reference_groups: Vec<String>,
    #[serde(default = "default_levels")]
    pub levels: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flows: Option<FlowConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pca: Option<PcaOptions>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl RunConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(GfopError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(GfopError::from)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// A complete configuration for a typical study.
    pub fn example() -> Self {
        Self {
            network: PathBuf::from("gnps_network.tsv"),
            ontology: PathBuf::from("foodomics_ontology.tsv"),
            sample_types: SampleTypes::All,
            sample_groups: vec!["G1".to_string()],
            reference_groups: vec!["G4".to_string()],
            levels: ONTOLOGY_LEVELS,
            flows: Some(FlowConfig {
                groups_included: vec!["G4".to_string()],
                max_level: ONTOLOGY_LEVELS,
            }),
            metadata: Some(MetadataConfig {
                path: PathBuf::from("sample_metadata.csv"),
                merge_column: "diet".to_string(),
            }),
            pca: Some(PcaOptions::default()),
            output_dir: default_output_dir(),
        }
    }

    /// Execute the run and write every output under `output_dir`.
    pub fn run(&self) -> Result<RunSummary> {
        let ontology = Arc::new(Ontology::from_tsv(&self.ontology, self.sample_types)?);
        let network = NetworkTable::from_tsv(&self.network)?;
        log::info!(
            "Loaded {} clusters and {} reference foods",
            network.n_clusters(),
            ontology.len()
        );

        let flows = match &self.flows {
            Some(cfg) => Some(FoodFlows::new(
                &network,
                &ontology,
                &cfg.groups_included,
                cfg.max_level,
            )?),
            None => None,
        };

        let mut counts = FoodCounts::builder()
            .sample_groups(&self.sample_groups)
            .reference_groups(&self.reference_groups)
            .levels(self.levels)
            .build(network, Arc::clone(&ontology))?;
        if let Some(meta) = &self.metadata {
            counts.update_groups(&meta.path, &meta.merge_column)?;
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let mut outputs = Vec::new();

        let counts_path = self.output_dir.join("food_counts.tsv");
        counts.to_tsv(&counts_path)?;
        outputs.push(counts_path);

        if let Some(flows) = &flows {
            let edges_path = self.output_dir.join("flow_edges.tsv");
            let nodes_path = self.output_dir.join("flow_nodes.tsv");
            flows.to_tsv(&edges_path, &nodes_path)?;
            outputs.push(edges_path);
            outputs.push(nodes_path);
        }

        if let Some(options) = &self.pca {
            let pca = counts.pca(options)?;
            let pca_path = self.output_dir.join("pca_scores.tsv");
            pca.to_tsv(&pca_path)?;
            outputs.push(pca_path);
        }

        Ok(RunSummary {
            n_samples: counts.sample_metadata().n_samples(),
            n_rows: counts.counts().len(),
            n_flow_edges: flows.as_ref().map(|f| f.edges().len()),
            outputs,
        })
    }
}

/// What a [`RunConfig::run`] produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub n_samples: usize,
    /// Rows in the long food count table.
    pub n_rows: usize,
    pub n_flow_edges: Option<usize>,
    pub outputs: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_yaml_roundtrip() {
        let config = RunConfig::example();
        let yaml = config.to_yaml().unwrap();
        let parsed = RunConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_minimal_yaml_defaults() {
        let yaml = "
network: net.tsv
ontology: ontology.tsv
sample_groups: [G1]
reference_groups: [G4, G5]
flows:
  groups_included: [G4]
";
        let config = RunConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.levels, 6);
        assert_eq!(config.sample_types, SampleTypes::All);
        assert_eq!(config.flows.unwrap().max_level, 6);
        assert!(config.metadata.is_none());
        assert!(config.pca.is_none());
        assert_eq!(config.output_dir, PathBuf::from("gfop_output"));
    }

    #[test]
    fn test_sample_types_parsed() {
        let yaml = "
network: net.tsv
ontology: ontology.tsv
sample_types: complex
sample_groups: [G1]
reference_groups: [G4]
pca:
  level: 2
";
        let config = RunConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.sample_types, SampleTypes::Complex);
        let pca = config.pca.unwrap();
        assert_eq!(pca.level, 2);
        assert_eq!(pca.n_components, 3);
        assert!(pca.apply_clr);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            RunConfig::from_yaml("network: [unclosed"),
            Err(GfopError::Yaml(_))
        ));
    }

    #[test]
    fn test_missing_network_file() {
        let dir = tempfile::tempdir().unwrap();
        let ontology = dir.path().join("ontology.tsv");
        std::fs::write(
            &ontology,
            "filename\tsample_name\tsample_type_group1\tsample_type_group2\t\
             sample_type_group3\tsample_type_group4\tsample_type_group5\t\
             sample_type_group6\tsimple_complex\n",
        )
        .unwrap();

        let config = RunConfig {
            network: dir.path().join("missing.tsv"),
            ontology,
            output_dir: dir.path().join("out"),
            ..RunConfig::example()
        };
        assert!(matches!(config.run(), Err(GfopError::FileNotFound(_))));
    }

    #[test]
    fn test_summary_json() {
        let summary = RunSummary {
            n_samples: 2,
            n_rows: 10,
            n_flow_edges: None,
            outputs: vec![PathBuf::from("out/food_counts.tsv")],
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"n_flow_edges\":null"));
        let parsed: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.outputs, summary.outputs);
    }
}
