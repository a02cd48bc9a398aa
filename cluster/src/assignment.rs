use std::io::{Read, Write};

use cinerec_corpus::table;

use crate::error::ClusterError;

const SEP: char = ';';

/// ClusterAssignment maps each document index to a cluster id in `[0, k)`.
///
/// Produced by one clustering run; cluster ids are arbitrary labels and
/// are not stable across reruns. An assignment is only meaningful together
/// with the vector set it was fitted on.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    pub labels: Vec<usize>,
    pub k: usize,
}

impl ClusterAssignment {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Cluster id for a document index.
    pub fn label(&self, index: usize) -> Option<usize> {
        self.labels.get(index).copied()
    }

    /// The partition as sets of document indices, one per cluster id.
    /// Useful for comparing two runs structurally, since label numbering
    /// may permute between runs.
    pub fn partition(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.k];
        for (i, &l) in self.labels.iter().enumerate() {
            groups[l].push(i);
        }
        groups.sort();
        groups
    }
}

/// Write an assignment as a `title;cluster` table, one row per document,
/// aligned 1:1 with the corpus by position.
pub fn save_assignment(
    assignment: &ClusterAssignment,
    titles: &[&str],
    w: &mut dyn Write,
) -> Result<(), ClusterError> {
    if titles.len() != assignment.len() {
        return Err(ClusterError::StaleArtifact(format!(
            "{} titles for {} labels",
            titles.len(),
            assignment.len()
        )));
    }

    let write_err = |e: std::io::Error| ClusterError::Io(e.to_string());
    writeln!(w, "title{SEP}cluster").map_err(write_err)?;
    for (title, &label) in titles.iter().zip(&assignment.labels) {
        let cluster = label.to_string();
        writeln!(w, "{}", table::write_row(&[title, &cluster], SEP)).map_err(write_err)?;
    }
    Ok(())
}

/// Read an assignment written by [`save_assignment`]. Returns the titles
/// alongside the labels so callers can validate alignment with their
/// corpus. An assignment with no rows fails with `NotTrained`.
pub fn load_assignment(r: &mut dyn Read) -> Result<(Vec<String>, ClusterAssignment), ClusterError> {
    let mut data = String::new();
    r.read_to_string(&mut data)
        .map_err(|e| ClusterError::Io(e.to_string()))?;

    let rows = table::parse(&data, SEP).map_err(|e| ClusterError::InvalidFormat(e.to_string()))?;
    let mut iter = rows.into_iter();
    let header = iter
        .next()
        .ok_or_else(|| ClusterError::InvalidFormat("empty assignment file".into()))?;

    let title_col = header
        .iter()
        .position(|h| h.trim() == "title")
        .ok_or_else(|| ClusterError::InvalidFormat("missing 'title' column".into()))?;
    let cluster_col = header
        .iter()
        .position(|h| h.trim() == "cluster")
        .ok_or_else(|| ClusterError::InvalidFormat("missing 'cluster' column".into()))?;

    let mut titles = Vec::new();
    let mut labels = Vec::new();
    for (line, row) in iter.enumerate() {
        let title = row.get(title_col).ok_or_else(|| {
            ClusterError::InvalidFormat(format!("row {}: missing title", line + 2))
        })?;
        let label: usize = row
            .get(cluster_col)
            .map(|s| s.trim())
            .ok_or_else(|| ClusterError::InvalidFormat(format!("row {}: missing cluster", line + 2)))?
            .parse()
            .map_err(|_| {
                ClusterError::InvalidFormat(format!("row {}: invalid cluster id", line + 2))
            })?;
        titles.push(title.clone());
        labels.push(label);
    }

    if labels.is_empty() {
        return Err(ClusterError::NotTrained);
    }

    let k = labels.iter().max().map(|m| m + 1).unwrap_or(0);
    Ok((titles, ClusterAssignment { labels, k }))
}
