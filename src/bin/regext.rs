mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use regext::DEFAULT_STORE_FILE;
use std::path::PathBuf;

use commands::{cmd_delete, cmd_extract, cmd_list, cmd_save, cmd_shell, cmd_show};

#[derive(Parser)]
#[command(name = "regext")]
#[command(
    about = "Named regular expressions for extracting matches from HTTP responses",
    long_about = "regext - Store named regular expressions and extract unique matches from batches of HTTP responses\n\n\
    Patterns are kept in a JSON file (name -> regex). Extraction drops responses whose \n\
    byte length was already seen, scans the rest and prints the sorted, deduplicated matches.\n\n\
    Examples:\n\
      regext save api-keys 'key=([A-Za-z0-9]{32})'\n\
      regext list\n\
      regext extract -p api-keys responses/*.bin\n\
      regext extract -p api-keys --ndjson --format json captured.ndjson\n\
      regext shell"
)]
#[command(version)]
struct Cli {
    /// Pattern file (JSON object mapping pattern name to regex)
    #[arg(
        long,
        global = true,
        env = "REGEXT_STORE",
        default_value = DEFAULT_STORE_FILE,
        value_name = "FILE"
    )]
    store: PathBuf,

    /// Diagnostic output on stderr (-v info, -vv debug, -vvv trace; RUST_LOG overrides)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a named pattern, overwriting any pattern with the same name
    Save {
        /// Pattern name
        #[arg(value_name = "NAME")]
        name: String,

        /// Regular expression source
        #[arg(value_name = "PATTERN")]
        pattern: String,

        /// Compile the pattern first and refuse to save it if it is invalid
        #[arg(short, long)]
        check: bool,
    },

    /// List saved patterns
    List {
        /// Output the whole pattern file as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the source of a saved pattern
    Show {
        /// Pattern name
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Delete a saved pattern
    Delete {
        /// Pattern name
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Extract unique regex matches from HTTP response bodies
    Extract {
        /// Name of the saved pattern to apply
        #[arg(short, long, value_name = "NAME")]
        pattern: String,

        /// Response files (one response body per file, .gz supported), or "-" for stdin
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Inputs are NDJSON batches: one {"response": "..."} object per line
        #[arg(long)]
        ndjson: bool,

        /// Skip responses that are not valid UTF-8 instead of replacing bad bytes
        #[arg(long)]
        strict: bool,

        /// Output format: text (default, log lines) or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Interactive session: save, load, select and extract from one prompt
    Shell {
        /// Skip responses that are not valid UTF-8 instead of replacing bad bytes
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli_utils::init_tracing(cli.verbose);

    match cli.command {
        Commands::Save {
            name,
            pattern,
            check,
        } => cmd_save(cli.store, name, pattern, check),
        Commands::List { json } => cmd_list(cli.store, json),
        Commands::Show { name } => cmd_show(cli.store, name),
        Commands::Delete { name } => cmd_delete(cli.store, name),
        Commands::Extract {
            pattern,
            inputs,
            ndjson,
            strict,
            format,
        } => cmd_extract(cli.store, pattern, inputs, ndjson, strict, format),
        Commands::Shell { strict } => cmd_shell(cli.store, strict),
    }
}
