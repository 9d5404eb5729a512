//! Food counts and food flows on a small in-memory study.
//!
//! This example shows how to:
//! 1. Load a network and an ontology
//! 2. Build hierarchical food counts
//! 3. Inspect proportions and flows

use gfop::prelude::*;
use std::sync::Arc;

const NETWORK: &str = "\
cluster index\tUniqueFileSources\tDefaultGroups\tG1\tG2\tG3\tG4\tG5\tG6
1\tstool_a.mzXML|stool_b.mzXML\tG1\t2\t0\t0\t0\t0\t0
2\tstool_a.mzXML|apple.mzXML\tG1,G4\t1\t0\t0\t1\t0\t0
3\tstool_a.mzXML|apple.mzXML|beef.mzXML\tG1,G4\t1\t0\t0\t2\t0\t0
4\tstool_b.mzXML|beef.mzXML\tG1,G4\t1\t0\t0\t1\t0\t0
5\tstool_b.mzXML|blank.mzXML\tG1,G4\t1\t0\t0\t1\t0\t0
6\tapple.mzXML|pear.mzXML|beef.mzXML\tG4\t0\t0\t0\t3\t0\t0
";

const ONTOLOGY: &str = "\
filename\tsample_name\tsample_type_group1\tsample_type_group2\tsample_type_group3\t\
sample_type_group4\tsample_type_group5\tsample_type_group6\tsimple_complex
apple.mzXML\tapple\tplant\tfruit\tfleshy\tpome\tapple\tapple\tsimple
pear.mzXML\tpear\tplant\tfruit\tfleshy\tpome\tpear\tpear\tsimple
beef.mzXML\tbeef\tanimal\tmeat\tred\tbovine\tbeef\tbeef\tsimple
blank.mzXML\twater\twater\twater\twater\twater\twater\twater\tsimple
";

fn main() -> Result<()> {
    println!("=== gfop Example ===\n");

    let network = NetworkTable::from_reader(NETWORK.as_bytes())?;
    let ontology = Arc::new(Ontology::from_reader(ONTOLOGY.as_bytes(), SampleTypes::All)?);
    println!("Network: {} clusters", network.n_clusters());
    println!("Ontology: {} reference foods", ontology.len());
    println!();

    let flows = FoodFlows::new(&network, &ontology, &["G4"], 3)?;

    let food_counts = FoodCounts::builder()
        .sample_groups(&["G1"])
        .reference_groups(&["G4"])
        .levels(3)
        .build(network, Arc::clone(&ontology))?;

    println!("=== Food Counts ===\n");
    for level in 0..=3 {
        let rows = food_counts.filter::<&str>(None, level);
        println!("Level {}: {} rows", level, rows.len());
        for row in rows.iter() {
            println!("  {:<16} {:<8} {}", row.filename, row.food_type, row.count);
        }
    }
    println!();

    println!("=== Level-2 Proportions ===\n");
    let proportions = food_counts.proportions(2)?;
    for (i, filename) in proportions.filenames.iter().enumerate() {
        let cells: Vec<String> = proportions
            .food_types
            .iter()
            .zip(proportions.row(i))
            .map(|(food, p)| format!("{}={:.2}", food, p))
            .collect();
        println!("  {:<16} {}", filename, cells.join(" "));
    }
    println!();

    println!("=== Food Flows ===\n");
    for edge in flows.edges() {
        println!("  {} -> {} ({})", edge.source, edge.target, edge.value);
    }

    Ok(())
}
