use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::language::LanguageConfig;

pub mod gda;
pub mod gff;
pub mod strref;
pub mod tlk;

#[derive(Subcommand)]
pub enum Commands {
    /// GFF4 container operations
    Gff {
        #[command(subcommand)]
        command: GffCommands,
    },

    /// GDA table operations
    Gda {
        #[command(subcommand)]
        command: GdaCommands,
    },

    /// Talk table operations
    Tlk {
        #[command(subcommand)]
        command: TlkCommands,
    },

    /// Resolve a string reference through stacked talk tables
    Strref {
        /// String reference (high byte set selects the alternate tables)
        str_ref: u32,

        /// Directories to load talk tables from (later ones override earlier ones)
        #[arg(short, long, required = true)]
        dir: Vec<PathBuf>,

        /// Main talk table name (male, or ungendered)
        #[arg(short, long)]
        table: String,

        /// Female variant of the main talk table
        #[arg(long)]
        female: Option<String>,

        /// Alternate talk table name
        #[arg(long)]
        alt: Option<String>,

        /// Resolve for a female player character
        #[arg(long)]
        female_gender: bool,

        /// Language configuration JSON (defaults to the standard Aurora table)
        #[arg(long)]
        language_config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum GffCommands {
    /// Print a GFF4 file as JSON
    Dump {
        /// GFF4 file to read
        path: PathBuf,

        /// Expected type ID (e.g. "G2DA"); defaults to the file's own
        #[arg(long)]
        type_id: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum GdaCommands {
    /// Show columns and row count of a (merged) table
    Info {
        /// GDA files, base first
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print one row
    Row {
        /// GDA files, base first
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Global row index
        #[arg(short, long)]
        row: usize,

        /// Only print these columns (by name)
        #[arg(short, long)]
        column: Vec<String>,
    },

    /// Find the row with a given ID
    Find {
        /// GDA files, base first
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Value of the ID column
        #[arg(long)]
        id: u64,
    },
}

#[derive(Subcommand)]
pub enum TlkCommands {
    /// Get a single entry
    Get {
        /// Talk table to read (binary or GFF)
        path: PathBuf,

        /// String reference
        str_ref: u32,

        /// Language configuration JSON
        #[arg(long)]
        language_config: Option<PathBuf>,
    },

    /// List entries
    List {
        /// Talk table to read (binary or GFF)
        path: PathBuf,

        /// Maximum entries to display
        #[arg(short, long)]
        limit: Option<usize>,

        /// Language configuration JSON
        #[arg(long)]
        language_config: Option<PathBuf>,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Gff { command } => command.execute(),
            Commands::Gda { command } => command.execute(),
            Commands::Tlk { command } => command.execute(),
            Commands::Strref {
                str_ref,
                dir,
                table,
                female,
                alt,
                female_gender,
                language_config,
            } => strref::execute(
                *str_ref,
                dir,
                table,
                female.as_deref(),
                alt.as_deref(),
                *female_gender,
                language_config.as_deref(),
            ),
        }
    }
}

impl GffCommands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            GffCommands::Dump { path, type_id } => gff::dump(path, type_id.as_deref()),
        }
    }
}

impl GdaCommands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            GdaCommands::Info { files } => gda::info(files),
            GdaCommands::Row { files, row, column } => gda::row(files, *row, column),
            GdaCommands::Find { files, id } => gda::find(files, *id),
        }
    }
}

impl TlkCommands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            TlkCommands::Get {
                path,
                str_ref,
                language_config,
            } => tlk::get(path, *str_ref, language_config.as_deref()),
            TlkCommands::List {
                path,
                limit,
                language_config,
            } => tlk::list(path, *limit, language_config.as_deref()),
        }
    }
}

/// The language table from a JSON file, or the standard one.
pub(crate) fn load_languages(path: Option<&Path>) -> anyhow::Result<LanguageConfig> {
    use anyhow::Context;

    match path {
        Some(path) => LanguageConfig::from_json_file(path)
            .with_context(|| format!("Failed to load language config {}", path.display())),
        None => Ok(LanguageConfig::aurora_default()),
    }
}
