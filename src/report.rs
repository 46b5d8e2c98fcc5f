//! Tabular export of pipeline outputs.
//!
//! Every table keeps the document filename as its row key (and, for the
//! distance matrix, its column key) so external plotting can join them.

use crate::assignment::ClusterAssignment;
use crate::distance::DistanceMatrix;
use crate::hierarchy::CutQuality;
use crate::pca::PcaProjection;
use crate::vectorizer::DocumentTermMatrix;
use crate::wordfreq::WordCount;
use std::io::{self, Write};

/// Quote a CSV field when it contains a separator, quote or newline
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_row<W: Write, I, S>(out: &mut W, cells: I) -> io::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line = cells
        .into_iter()
        .map(|c| field(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{}", line)
}

pub fn write_term_matrix<W: Write>(out: &mut W, matrix: &DocumentTermMatrix) -> io::Result<()> {
    write_row(
        out,
        std::iter::once("document").chain(matrix.vocabulary().terms().iter().map(String::as_str)),
    )?;
    for (doc, label) in matrix.labels().iter().enumerate() {
        write_row(
            out,
            std::iter::once(label.clone()).chain(matrix.row(doc).iter().map(|c| c.to_string())),
        )?;
    }
    Ok(())
}

pub fn write_distances<W: Write>(out: &mut W, distances: &DistanceMatrix) -> io::Result<()> {
    write_row(
        out,
        std::iter::once("document").chain(distances.labels().iter().map(String::as_str)),
    )?;
    for (i, label) in distances.labels().iter().enumerate() {
        write_row(
            out,
            std::iter::once(label.clone()).chain(distances.row(i).iter().map(|d| format!("{:.6}", d))),
        )?;
    }
    Ok(())
}

pub fn write_assignment<W: Write>(out: &mut W, assignment: &ClusterAssignment) -> io::Result<()> {
    write_row(out, ["document", "cluster"])?;
    for (label, id) in assignment.iter() {
        write_row(out, [label.to_string(), id.to_string()])?;
    }
    Ok(())
}

/// Missing intra-cluster distances are written as an empty cell
pub fn write_cuts<W: Write>(out: &mut W, cuts: &[CutQuality]) -> io::Result<()> {
    write_row(
        out,
        ["cut_level", "clusters", "mean_cluster_size", "mean_intra_distance"],
    )?;
    for cut in cuts {
        write_row(
            out,
            [
                cut.cut_level.to_string(),
                cut.clusters.to_string(),
                format!("{:.6}", cut.mean_cluster_size),
                cut.mean_intra_distance
                    .map(|d| format!("{:.6}", d))
                    .unwrap_or_default(),
            ],
        )?;
    }
    Ok(())
}

pub fn write_pca<W: Write>(out: &mut W, pca: &PcaProjection) -> io::Result<()> {
    write_row(out, ["document", "pc1", "pc2"])?;
    for (label, (x, y)) in pca.labels.iter().zip(&pca.points) {
        write_row(out, [label.clone(), format!("{:.6}", x), format!("{:.6}", y)])?;
    }
    Ok(())
}

pub fn write_word_frequencies<W: Write>(out: &mut W, words: &[WordCount]) -> io::Result<()> {
    write_row(out, ["word", "count"])?;
    for w in words {
        write_row(out, [w.word.clone(), w.count.to_string()])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::build_term_counts;

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_field_quoting() {
        assert_eq!(field("plain.txt"), "plain.txt");
        assert_eq!(field("a,b.txt"), "\"a,b.txt\"");
        assert_eq!(field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_term_matrix_keeps_filenames() {
        let dtm = build_term_counts(&[
            ("Adams_1797.txt".to_string(), vec!["navy".to_string(), "navy".to_string()]),
            ("Jefferson_1801.txt".to_string(), vec!["peace".to_string()]),
        ]);
        let csv = render(|out| write_term_matrix(out, &dtm));
        assert_eq!(
            csv,
            "document,navy,peace\nAdams_1797.txt,2,0\nJefferson_1801.txt,0,1\n"
        );
    }

    #[test]
    fn test_cuts_leave_missing_distance_empty() {
        let cuts = vec![CutQuality {
            cut_level: 2,
            clusters: 3,
            mean_cluster_size: 1.0,
            mean_intra_distance: None,
        }];
        let csv = render(|out| write_cuts(out, &cuts));
        assert!(csv.ends_with("2,3,1.000000,\n"));
    }

    #[test]
    fn test_assignment_rows() {
        let assignment =
            ClusterAssignment::from_groups(vec!["a.txt".into(), "b.txt".into()], &[5, 5]);
        let csv = render(|out| write_assignment(out, &assignment));
        assert_eq!(csv, "document,cluster\na.txt,1\nb.txt,1\n");
    }
}
