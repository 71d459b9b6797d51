use anyhow::Result;
use clap::Parser;

use cellmesh::CatalogCategory;

mod commands;

use commands::{run_rank, run_store_build, run_store_info, Cli, Commands, StoreCommands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cellmesh::init_logger(cli.verbose);

    match cli.command {
        Commands::Rank(args) => run_rank(args),
        Commands::Store(StoreCommands::Build {
            output,
            cells,
            genes,
            cell_gene,
            cell_components,
            chromosomes,
            cell_lines,
        }) => run_store_build(
            &output,
            cells,
            genes,
            cell_gene,
            [
                (CatalogCategory::CellComponents, cell_components),
                (CatalogCategory::Chromosomes, chromosomes),
                (CatalogCategory::CellLines, cell_lines),
            ],
        ),
        Commands::Store(StoreCommands::Info { store }) => run_store_info(&store),
    }
}
