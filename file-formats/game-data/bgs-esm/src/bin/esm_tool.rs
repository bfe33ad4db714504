use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use bgs_esm::{Database, GameEdition, GridId, ParseOptions, Query, discover, types::FormId};

#[derive(Parser)]
#[command(name = "esm_tool")]
#[command(about = "A tool for inspecting Bethesda master and plugin files", long_about = None)]
struct Cli {
    /// Force the game edition instead of inferring it
    #[arg(short, long, global = true, value_parser = parse_edition)]
    edition: Option<GameEdition>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the root record and top-level groups
    Info {
        /// The master or plugin file
        file: PathBuf,
    },
    /// Count records by type without decoding them
    Stats {
        /// The master or plugin file
        file: PathBuf,
    },
    /// Look up a record by editor id
    Find {
        /// The master or plugin file
        file: PathBuf,
        /// Editor id (case-insensitive)
        editor_id: String,
    },
    /// Look up an exterior cell by grid coordinate
    Cell {
        /// The master or plugin file
        file: PathBuf,
        /// Worldspace form id in hex (0 for Morrowind)
        #[arg(short, long, default_value = "3C", value_parser = parse_form_id)]
        world: FormId,
        /// Grid x
        #[arg(allow_hyphen_values = true)]
        x: i32,
        /// Grid y
        #[arg(allow_hyphen_values = true)]
        y: i32,
    },
}

fn parse_edition(s: &str) -> Result<GameEdition, String> {
    let wanted = s.to_ascii_lowercase().replace([' ', '_', '-', ':'], "");
    GameEdition::ALL
        .into_iter()
        .find(|e| {
            e.to_string().to_ascii_lowercase().replace([' ', ':'], "") == wanted
                || format!("{e:?}").to_ascii_lowercase() == wanted
        })
        .ok_or_else(|| format!("unknown edition '{s}'"))
}

fn parse_form_id(s: &str) -> Result<FormId, String> {
    u32::from_str_radix(s.trim_start_matches("0x"), 16)
        .map(FormId)
        .map_err(|e| format!("invalid form id '{s}': {e}"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut options = ParseOptions::default();
    if let Some(edition) = cli.edition {
        options = options.with_edition(edition);
    }

    match cli.command {
        Commands::Info { file } => {
            let db = Database::open_with_options(&file, options.with_eager_spatial_groups(false))
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let header = db.header();

            println!("Plugin File Information:");
            println!("  Schema: {}", db.format());
            println!("  Edition: {}", db.edition());
            println!("  Version: {:.2}", header.version);
            println!("  Records: {}", header.num_records);
            println!("  Author: {}", header.author);
            println!("  Description: {}", header.description);
            println!("  Localized: {}", db.is_localized());
            for master in header.master_names() {
                println!("  Master: {master}");
            }
            if !db.top_groups().is_empty() {
                println!("Top-level groups:");
                for group in db.top_groups() {
                    println!("  {} ({} bytes)", group.label_tag(), group.data_size());
                }
            }
        }
        Commands::Stats { file } => {
            let mut reader = BufReader::new(
                File::open(&file).with_context(|| format!("Failed to open {}", file.display()))?,
            );
            let index = discover(&mut reader).context("Failed to walk chunk headers")?;

            println!("{} records in {} groups", index.records.len(), index.groups.len());
            println!("{} compressed", index.compressed_records());
            for (tag, count) in index.tag_histogram() {
                println!("  {tag}: {count}");
            }
        }
        Commands::Find { file, editor_id } => {
            let db = Database::open_with_options(&file, options)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            db.load_all().context("Failed to load all groups")?;
            match db.query(&Query::EditorId(&editor_id))? {
                Some(record) => println!("{} {} {:#?}", record.tag(), record.form_id(), record.data),
                None => println!("No record with editor id '{editor_id}'"),
            }
        }
        Commands::Cell { file, world, x, y } => {
            let db = Database::open_with_options(&file, options)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let grid = GridId::exterior(world, x, y);
            match db.query(&Query::Grid(grid))? {
                Some(cell) => {
                    println!("Cell {grid}: {} {:?}", cell.form_id(), cell.editor_id());
                    if let Some(land) = db.query(&Query::Land(grid))? {
                        println!("  Land: {}", land.form_id());
                    }
                }
                None => println!("No cell at {grid}"),
            }
        }
    }

    Ok(())
}
