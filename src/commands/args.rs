//! Command-line argument definitions for the cellmesh CLI.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::helpers::parse_alpha;

#[derive(Parser)]
#[command(name = "cellmesh")]
#[command(version)]
#[command(about = "Rank cell types for a marker gene list using literature co-occurrence counts")]
#[command(
    long_about = "cellmesh: identify the most probable cell types for a ranked marker gene list.

Each MeSH cell type carries counts of PubMed articles mentioning it together with a gene.
A query is scored against every cell sharing at least one gene with it, as the
log-likelihood of drawing the query from the cell's gene distribution.

WORKFLOW:
  1. Build a store:   cellmesh store build -o store --cells cells.tsv --genes genes.tsv --cell-gene cell_gene.tsv
  2. Rank cells:      cellmesh rank -s store --species mouse -g CD79A -g MS4A1

OUTPUT FORMAT (rank):
  Format auto-detected from extension:
  - .tsv or no extension: Plain TSV
  - .tsv.gz: Gzip-compressed TSV
  - .parquet: Apache Parquet with zstd compression
  - -: stdout (TSV)

  Tab-separated columns: rank, cell_id, cell_name, score, overlapping_genes, pmids"
)]
#[command(after_help = "EXAMPLES:
  # Top 10 cell types for mouse B-cell markers
  cellmesh rank -s store --species mouse -g CD79A -g MS4A1 -g CD79B --top 10

  # Genes from a file, 8 workers, count threshold 3, smoothing
  cellmesh rank -s store --genes-file markers.txt -j 8 -t 3 --alpha 0.5 -o ranked.tsv

  # Everything from a TOML query file
  cellmesh rank --config query.toml")]
pub struct Cli {
    /// Increase log verbosity (-v progress, -vv timings)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank cell types for a query gene list
    Rank(RankArgs),

    /// Store operations: build and inspect reference stores
    #[command(subcommand)]
    Store(StoreCommands),
}

#[derive(Args)]
pub struct RankArgs {
    /// Reference store directory
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// TOML query file. Command-line flags override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Query gene symbol, strongest marker first. Repeatable; comma-separated lists accepted.
    #[arg(short, long = "gene", value_delimiter = ',')]
    pub genes: Vec<String>,

    /// File with one gene symbol per line, strongest marker first
    #[arg(long)]
    pub genes_file: Option<PathBuf>,

    /// Species of the query genes (human, homo_sapiens, mouse, mus_musculus, worm, c_elegans)
    #[arg(long)]
    pub species: Option<String>,

    /// Number of scoring workers
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// A gene co-occurs with a cell when its count is greater than this
    #[arg(short = 't', long)]
    pub count_threshold: Option<u64>,

    /// Smoothing factor in (0, 1)
    #[arg(long, value_parser = parse_alpha)]
    pub alpha: Option<f64>,

    /// Drop cell-component ids from the catalog
    #[arg(long)]
    pub exclude_cell_components: bool,

    /// Keep chromosome ids in the catalog
    #[arg(long)]
    pub include_chromosomes: bool,

    /// Keep cell-line ids in the catalog
    #[arg(long)]
    pub include_cell_lines: bool,

    /// Report only the N best cells
    #[arg(long)]
    pub top: Option<usize>,

    /// Output path (.tsv, .tsv.gz, .parquet, or - for stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum StoreCommands {
    /// Build a store directory from tab-separated tables
    #[command(after_help = "INPUT TABLES (tab-separated, optionally .gz):
  cells:      cell_id, cell_name
  genes:      gene, taxid
  cell-gene:  cell_id, gene, taxid, count, pmids (comma-joined)")]
    Build {
        /// Output store directory
        #[arg(short, long)]
        output: PathBuf,

        /// Cell table
        #[arg(long)]
        cells: PathBuf,

        /// Gene table
        #[arg(long)]
        genes: PathBuf,

        /// Cell-gene co-occurrence table
        #[arg(long)]
        cell_gene: PathBuf,

        /// Cell-component ids, one per line
        #[arg(long)]
        cell_components: Option<PathBuf>,

        /// Chromosome ids, one per line
        #[arg(long)]
        chromosomes: Option<PathBuf>,

        /// Cell-line ids, one per line
        #[arg(long)]
        cell_lines: Option<PathBuf>,
    },

    /// Print table sizes of a store
    Info {
        /// Store directory
        #[arg(short, long)]
        store: PathBuf,
    },
}
