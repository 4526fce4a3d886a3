use std::fs;

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{digit1, space1};
use nom::sequence::{preceded, separated_pair};
use nom::IResult;

use crate::error::Error;
use crate::graph::{VertexId, Weight};

/// reads an unsigned integer
fn read_integer(s: &str) -> IResult<&str, usize> {
    let (remaining, digits) = digit1(s)?;
    Ok((remaining, digits.parse::<usize>().unwrap()))
}

/// reads two integers separated by spaces
fn read_two_integers(s: &str) -> IResult<&str, (usize, usize)> {
    separated_pair(read_integer, space1, read_integer)(s)
}

/// reads a header line `p edge <n> <m>` (or `p col <n> <m>`), returns (n,m)
pub fn read_header(s: &str) -> IResult<&str, (usize, usize)> {
    preceded(alt((tag("p edge "), tag("p col "))), read_two_integers)(s)
}

/// reads an edge line `e <a> <b>` (WARNING: indices start at 1 in the DIMACS format)
pub fn read_edge(s: &str) -> IResult<&str, (usize, usize)> {
    preceded(tag("e "), read_two_integers)(s)
}

/** reads a DIMACS `.col` file, returns (nb_vertices, edges) with 0-based
vertex ids. Lines that are neither a header nor an edge are ignored; the
vertex count grows on demand if an edge goes past the announced header. */
pub fn read_col_file(filename: &str) -> Result<(usize, Vec<(VertexId, VertexId)>), Error> {
    let content = fs::read_to_string(filename).map_err(|source| Error::InstanceFile {
        path: filename.to_string(),
        source,
    })?;
    parse_col(filename, &content)
}

/// parses the content of a `.col` file (see [`read_col_file`])
pub fn parse_col(
    filename: &str,
    content: &str,
) -> Result<(usize, Vec<(VertexId, VertexId)>), Error> {
    let mut nb_vertices = 0;
    let mut edges = Vec::new();
    for line in content.lines() {
        if let Ok((_, (a, b))) = read_edge(line) {
            if a == 0 || b == 0 {
                return Err(Error::MalformedInstance {
                    path: filename.to_string(),
                    reason: format!("edge '{}' uses a 0 vertex id (ids start at 1)", line),
                });
            }
            nb_vertices = nb_vertices.max(a).max(b);
            edges.push((a - 1, b - 1));
        } else if let Ok((_, (n, m))) = read_header(line) {
            nb_vertices = nb_vertices.max(n);
            edges.reserve(m);
        }
        // any other line is a comment
    }
    Ok((nb_vertices, edges))
}

/** reads a `.col.w` weight file: whitespace-separated integers, one per
vertex, in vertex-id order. */
pub fn read_weight_file(filename: &str) -> Result<Vec<Weight>, Error> {
    let content = fs::read_to_string(filename).map_err(|source| Error::WeightFile {
        path: filename.to_string(),
        source,
    })?;
    content
        .split_whitespace()
        .map(|token| {
            token.parse::<Weight>().map_err(|_| Error::WeightFile {
                path: filename.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("invalid weight '{}'", token),
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_header() {
        let s = "p edge 2 1\ne 1 2";
        assert_eq!(read_header(s).unwrap().1, (2, 1));
    }

    #[test]
    fn test_read_header_col() {
        let s = "p col 2 1\ne 1 2";
        assert_eq!(read_header(s).unwrap().1, (2, 1));
    }

    #[test]
    fn test_read_edge() {
        let s = "e 1 2\n";
        assert_eq!(read_edge(s).unwrap().1, (1, 2));
    }

    #[test]
    fn test_parse_with_comments() {
        let content = "c this is a test comment\np edge 3 2\ne 1 2\ne 2 3\n";
        let (n, edges) = parse_col("test", content).unwrap();
        assert_eq!(n, 3);
        assert_eq!(edges, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_parse_grows_on_demand() {
        // header announces 2 vertices but an edge mentions vertex 4
        let content = "p edge 2 2\ne 1 2\ne 2 4\n";
        let (n, edges) = parse_col("test", content).unwrap();
        assert_eq!(n, 4);
        assert_eq!(edges, vec![(0, 1), (1, 3)]);
    }

    #[test]
    fn test_parse_without_header() {
        let content = "e 1 2\ne 2 3\n";
        let (n, edges) = parse_col("test", content).unwrap();
        assert_eq!(n, 3);
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_zero_based_edge_rejected() {
        assert!(parse_col("test", "e 0 1\n").is_err());
    }
}
