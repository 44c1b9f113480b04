//! Directed edge lists.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::{GraphError, Result, VertexId};

/// A directed graph as a flat list of `(source, target)` pairs.
///
/// The vertex count is the tight upper bound `max id + 1` when parsed from
/// a file, or caller-declared for in-memory construction (isolated trailing
/// vertices are legal).
#[derive(Debug, Clone)]
pub struct EdgeList {
    num_vertices: usize,
    edges: Vec<(VertexId, VertexId)>,
}

impl EdgeList {
    /// Parse an edge-list file.
    ///
    /// One edge per line as whitespace-separated `source target`; tokens
    /// past the second (e.g. weights) are ignored. Empty lines and lines
    /// starting with `#` are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);

        let mut edges = Vec::new();
        let mut max_id: Option<VertexId> = None;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let src = parse_vertex(tokens.next(), idx + 1)?;
            let dst = parse_vertex(tokens.next(), idx + 1)?;
            max_id = Some(max_id.map_or(src.max(dst), |m| m.max(src).max(dst)));
            edges.push((src, dst));
        }

        let num_vertices = max_id.map_or(0, |m| m as usize + 1);
        info!(
            "parsed {}: {} vertices, {} edges",
            path.display(),
            num_vertices,
            edges.len()
        );
        Ok(Self {
            num_vertices,
            edges,
        })
    }

    /// Build an edge list in memory over `num_vertices` vertices.
    pub fn from_edges(num_vertices: usize, edges: &[(VertexId, VertexId)]) -> Result<Self> {
        for &(src, dst) in edges {
            for v in [src, dst] {
                if v as usize >= num_vertices {
                    return Err(GraphError::VertexOutOfRange {
                        vertex: v,
                        count: num_vertices,
                    });
                }
            }
        }
        Ok(Self {
            num_vertices,
            edges: edges.to_vec(),
        })
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Number of directed edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// The edges in input order.
    pub fn edges(&self) -> &[(VertexId, VertexId)] {
        &self.edges
    }
}

fn parse_vertex(token: Option<&str>, line: usize) -> Result<VertexId> {
    let token = token.ok_or_else(|| GraphError::Parse {
        line,
        reason: "expected `source target`".to_string(),
    })?;
    token.parse().map_err(|_| GraphError::Parse {
        line,
        reason: format!("invalid vertex id `{token}`"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_edges() {
        let list = EdgeList::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
        assert_eq!(list.num_vertices(), 3);
        assert_eq!(list.num_edges(), 2);
    }

    #[test]
    fn test_from_edges_out_of_range() {
        let result = EdgeList::from_edges(2, &[(0, 5)]);
        assert!(matches!(
            result,
            Err(GraphError::VertexOutOfRange { vertex: 5, count: 2 })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# a comment").unwrap();
        writeln!(file, "0 1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "1 2").unwrap();
        writeln!(file, "2 0").unwrap();
        file.flush().unwrap();

        let list = EdgeList::from_file(file.path()).unwrap();
        assert_eq!(list.num_vertices(), 3);
        assert_eq!(list.edges(), &[(0, 1), (1, 2), (2, 0)]);
    }

    #[test]
    fn test_from_file_ignores_extra_tokens() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 1 0.5").unwrap();
        file.flush().unwrap();

        let list = EdgeList::from_file(file.path()).unwrap();
        assert_eq!(list.edges(), &[(0, 1)]);
    }

    #[test]
    fn test_from_file_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 1").unwrap();
        writeln!(file, "2").unwrap();
        file.flush().unwrap();

        let result = EdgeList::from_file(file.path());
        assert!(matches!(result, Err(GraphError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let list = EdgeList::from_file(file.path()).unwrap();
        assert_eq!(list.num_vertices(), 0);
        assert_eq!(list.num_edges(), 0);
    }
}
