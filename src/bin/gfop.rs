//! gfop - food counts and food flows from GNPS molecular networks
//!
//! Command-line interface over the gfop library.

use clap::{Args, Parser, Subcommand};
use gfop::analysis::PcaOptions;
use gfop::data::{Ontology, SampleTypes};
use gfop::error::Result;
use gfop::pipeline::{FoodCounts, FoodFlows, RunConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Food counts and food flows from GNPS molecular networks
#[derive(Parser)]
#[command(name = "gfop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by every subcommand that reads a network.
#[derive(Args)]
struct Inputs {
    /// Path to the GNPS network TSV
    #[arg(short, long)]
    network: PathBuf,

    /// Path to the FoodOmics ontology TSV
    #[arg(long)]
    ontology: PathBuf,

    /// Reference foods to use: simple, complex or all
    #[arg(long, default_value = "all")]
    sample_types: SampleTypes,
}

/// Study design for food counts.
#[derive(Args)]
struct Design {
    /// GNPS groups of the study samples (e.g. G1,G2)
    #[arg(short, long, value_delimiter = ',', required = true)]
    sample_groups: Vec<String>,

    /// GNPS groups of the reference foods (e.g. G4)
    #[arg(short, long, value_delimiter = ',', required = true)]
    reference_groups: Vec<String>,

    /// Number of ontology levels to roll up
    #[arg(long, default_value = "6")]
    levels: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute hierarchical food counts
    Counts {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        design: Design,

        /// Optional CSV/TSV file overriding sample groups
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Column of the metadata file holding the new group
        #[arg(long, default_value = "group")]
        merge_column: String,

        /// Output path for the long food count TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Also write proportions at this level
        #[arg(long)]
        proportions_level: Option<u8>,

        /// Output path for the proportions TSV
        #[arg(long, default_value = "food_proportions.tsv")]
        proportions_output: PathBuf,
    },

    /// Compute food flows between ontology levels
    Flows {
        #[command(flatten)]
        inputs: Inputs,

        /// GNPS groups to include (e.g. G4)
        #[arg(short, long, value_delimiter = ',', required = true)]
        groups: Vec<String>,

        /// Finest ontology level of the flow
        #[arg(long, default_value = "6")]
        max_level: usize,

        /// Output path for the edges TSV
        #[arg(long, default_value = "flow_edges.tsv")]
        edges: PathBuf,

        /// Output path for the nodes TSV
        #[arg(long, default_value = "flow_nodes.tsv")]
        nodes: PathBuf,
    },

    /// Ordinate samples by their food counts at one level
    Pca {
        #[command(flatten)]
        inputs: Inputs,

        #[command(flatten)]
        design: Design,

        /// Ontology level to ordinate
        #[arg(long, default_value = "3")]
        level: u8,

        /// Number of principal components
        #[arg(long, default_value = "3")]
        n_components: usize,

        /// Skip the CLR transform
        #[arg(long)]
        no_clr: bool,

        /// Restrict to these food types
        #[arg(long, value_delimiter = ',')]
        food_types: Option<Vec<String>>,

        /// Output path for the scores TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run everything described by a YAML configuration file
    Run {
        /// Path to run configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Generate an example run configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "gfop_config.yaml")]
        output: PathBuf,
    },
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Counts {
            inputs,
            design,
            metadata,
            merge_column,
            output,
            proportions_level,
            proportions_output,
        } => cmd_counts(
            &inputs,
            &design,
            metadata.as_deref(),
            &merge_column,
            &output,
            proportions_level.map(|level| (level, proportions_output)),
        ),

        Commands::Flows {
            inputs,
            groups,
            max_level,
            edges,
            nodes,
        } => cmd_flows(&inputs, &groups, max_level, &edges, &nodes),

        Commands::Pca {
            inputs,
            design,
            level,
            n_components,
            no_clr,
            food_types,
            output,
        } => {
            let options = PcaOptions {
                level,
                n_components,
                apply_clr: !no_clr,
                food_types,
            };
            cmd_pca(&inputs, &design, &options, &output)
        }

        Commands::Run { config, json } => cmd_run(&config, json),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_ontology(inputs: &Inputs) -> Result<Arc<Ontology>> {
    eprintln!("Loading ontology from {:?}...", inputs.ontology);
    let ontology = Ontology::from_tsv(&inputs.ontology, inputs.sample_types)?;
    eprintln!(
        "Loaded {} reference foods ({})",
        ontology.len(),
        inputs.sample_types
    );
    Ok(Arc::new(ontology))
}

fn build_counts(inputs: &Inputs, design: &Design) -> Result<FoodCounts> {
    let ontology = load_ontology(inputs)?;
    eprintln!("Computing food counts from {:?}...", inputs.network);
    FoodCounts::builder()
        .sample_groups(&design.sample_groups)
        .reference_groups(&design.reference_groups)
        .levels(design.levels)
        .build_from_path(&inputs.network, ontology)
}

/// Compute and write food counts
fn cmd_counts(
    inputs: &Inputs,
    design: &Design,
    metadata: Option<&Path>,
    merge_column: &str,
    output: &Path,
    proportions: Option<(u8, PathBuf)>,
) -> Result<()> {
    let mut food_counts = build_counts(inputs, design)?;

    if let Some(path) = metadata {
        let n = food_counts.update_groups(path, merge_column)?;
        eprintln!("Applied {} group overrides from {:?}", n, path);
    }

    eprintln!("Writing food counts to {:?}...", output);
    food_counts.to_tsv(output)?;

    if let Some((level, path)) = proportions {
        eprintln!("Writing level-{} proportions to {:?}...", level, path);
        food_counts.proportions(level)?.to_tsv(&path)?;
    }

    let counts = food_counts.counts();
    for level in counts.levels() {
        eprintln!("  level {}: {} food types", level, counts.food_types(level).len());
    }
    eprintln!(
        "Done! {} rows for {} samples",
        counts.len(),
        food_counts.sample_metadata().n_samples()
    );
    Ok(())
}

/// Compute and write food flows
fn cmd_flows(
    inputs: &Inputs,
    groups: &[String],
    max_level: usize,
    edges: &Path,
    nodes: &Path,
) -> Result<()> {
    let ontology = load_ontology(inputs)?;
    eprintln!("Computing food flows from {:?}...", inputs.network);
    let flows = FoodFlows::from_path(&inputs.network, &ontology, groups, max_level)?;

    eprintln!("Writing flows to {:?} and {:?}...", edges, nodes);
    flows.to_tsv(edges, nodes)?;

    eprintln!(
        "Done! {} edges, {} nodes",
        flows.edges().len(),
        flows.nodes().len()
    );
    Ok(())
}

/// Ordinate one level and write the scores
fn cmd_pca(inputs: &Inputs, design: &Design, options: &PcaOptions, output: &Path) -> Result<()> {
    let food_counts = build_counts(inputs, design)?;

    eprintln!("Running PCA at level {}...", options.level);
    let pca = food_counts.pca(options)?;

    eprintln!("Writing scores to {:?}...", output);
    pca.to_tsv(output)?;

    for (k, ratio) in pca.explained_variance_ratio.iter().enumerate() {
        eprintln!("  PC{}: {:.1}% of variance", k + 1, ratio * 100.0);
    }
    Ok(())
}

/// Run from configuration
fn cmd_run(config_path: &Path, json: bool) -> Result<()> {
    eprintln!("Loading run configuration from {:?}...", config_path);
    let config = RunConfig::from_file(config_path)?;

    let summary = config.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    eprintln!(
        "Done! {} rows for {} samples",
        summary.n_rows, summary.n_samples
    );
    if let Some(n) = summary.n_flow_edges {
        eprintln!("  {} flow edges", n);
    }
    for path in &summary.outputs {
        eprintln!("  wrote {:?}", path);
    }
    Ok(())
}

/// Write an example configuration
fn cmd_example(output_path: &Path) -> Result<()> {
    let yaml = RunConfig::example().to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
