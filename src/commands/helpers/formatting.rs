//! Text formatting of ranked results.

use cellmesh::ScoredResult;

pub const RESULT_HEADER: &str =
    "rank\tcell_id\tcell_name\tscore\toverlapping_genes\tpmids\n";

/// Score with 4 decimals; `-inf` for cells without count mass.
pub fn format_score(score: f64) -> String {
    if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{:.4}", score)
    }
}

/// `GENE:id|id;GENE:id`, genes in sorted order.
pub fn format_pmids(result: &ScoredResult) -> String {
    result
        .pmids
        .iter()
        .map(|(gene, ids)| format!("{}:{}", gene, ids.join("|")))
        .collect::<Vec<_>>()
        .join(";")
}

/// One TSV row, newline-terminated. `rank` is 1-based.
pub fn format_result_row(rank: usize, result: &ScoredResult) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\n",
        rank,
        result.cell_id,
        result.cell_name,
        format_score(result.score),
        result.overlapping_genes.join(","),
        format_pmids(result)
    )
}
