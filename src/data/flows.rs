//! Food flow edges and nodes for flow diagrams.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Identifier of a category at a level, e.g. `meat_2`.
pub fn node_id(category: &str, level: usize) -> String {
    format!("{}_{}", category, level)
}

/// A weighted transition between categories of adjacent levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub source: String,
    pub target: String,
    pub value: u64,
    /// Flow type; the target identifier.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A diagram node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    pub level: usize,
}

/// Edges and nodes of a multi-level food flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodFlowTable {
    pub edges: Vec<FlowEdge>,
    pub nodes: Vec<FlowNode>,
}

impl FoodFlowTable {
    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Total edge weight leaving nodes at `level`.
    pub fn outflow(&self, level: usize) -> u64 {
        let suffix = format!("_{}", level);
        self.edges
            .iter()
            .filter(|e| e.source.ends_with(&suffix))
            .map(|e| e.value)
            .sum()
    }

    /// Write edges as TSV (`source`, `target`, `value`, `type`).
    pub fn write_edges_tsv<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "source\ttarget\tvalue\ttype")?;
        for e in &self.edges {
            writeln!(writer, "{}\t{}\t{}\t{}", e.source, e.target, e.value, e.kind)?;
        }
        Ok(())
    }

    /// Write nodes as TSV (`id`, `level`).
    pub fn write_nodes_tsv<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "id\tlevel")?;
        for n in &self.nodes {
            writeln!(writer, "{}\t{}", n.id, n.level)?;
        }
        Ok(())
    }

    /// Write edges and nodes to two TSV files.
    pub fn to_tsv<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        edges_path: P,
        nodes_path: Q,
    ) -> Result<()> {
        let mut edges = BufWriter::new(File::create(edges_path)?);
        self.write_edges_tsv(&mut edges)?;
        edges.flush()?;

        let mut nodes = BufWriter::new(File::create(nodes_path)?);
        self.write_nodes_tsv(&mut nodes)?;
        nodes.flush()?;
        Ok(())
    }
}
