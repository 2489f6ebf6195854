//! gosgf: read SGF game records and print them back in another form.
//!
//! ## Usage
//!
//! - `gosgf [FILE]` - Same as `gosgf json [FILE]`
//! - `gosgf json [FILE] [--keep-raw] [--pretty]` - Structured JSON form
//! - `gosgf sgf [FILE]` - Normalized SGF
//! - `gosgf board [FILE] [--game N] [--path 0:1:3]` - Text board at a node
//!
//! Input is read from standard input when FILE is omitted.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::debug;
use serde_json::json;

use gosgf::collection::Collection;
use gosgf::error::SyntaxError;
use gosgf::path::Path;

/// gosgf: SGF game records as JSON, SGF or text boards
#[derive(Parser)]
#[command(name = "gosgf")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    json: JsonArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the structured JSON form of every game
    Json(JsonArgs),
    /// Write the games back as normalized SGF
    Sgf {
        /// SGF file (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Print the board position at a node
    Board {
        /// SGF file (stdin when omitted)
        file: Option<PathBuf>,
        /// Game index in the collection
        #[arg(long, default_value_t = 0)]
        game: usize,
        /// Node path such as 0:1:3 (default: end of the main line)
        #[arg(long)]
        path: Option<Path>,
    },
}

#[derive(Args)]
struct JsonArgs {
    /// SGF file (stdin when omitted)
    file: Option<PathBuf>,
    /// Keep unknown and rejected property values
    #[arg(long)]
    keep_raw: bool,
    /// Indent the output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Json(args)) => run_json(&args),
        Some(Commands::Sgf { file }) => run_sgf(file.as_ref()),
        Some(Commands::Board { file, game, path }) => run_board(file.as_ref(), game, path),
        None => run_json(&cli.json),
    }
}

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => fs::read(path).with_context(|| format!("cannot read {}", path.display())),
        None => {
            let mut data = Vec::new();
            io::stdin()
                .read_to_end(&mut data)
                .context("cannot read standard input")?;
            Ok(data)
        }
    }
}

fn load(file: Option<&PathBuf>, keep_raw: bool) -> Result<Result<Collection, SyntaxError>> {
    let data = read_input(file)?;
    debug!("read {} bytes", data.len());
    let mut games = Collection::with_keep_raw(keep_raw);
    Ok(games.add_sgf(&data).map(|_| games))
}

fn run_json(args: &JsonArgs) -> Result<()> {
    let value = match load(args.file.as_ref(), args.keep_raw)? {
        Ok(games) => serde_json::to_value(&games)?,
        // Content errors are reported in the output, not by the exit status.
        Err(e) => json!({
            "error": {
                "code": e.code(),
                "message": e.to_string(),
                "index": e.index,
                "line": e.line,
                "column": e.column,
            }
        }),
    };
    let out = if args.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{out}")?;
    Ok(())
}

fn run_sgf(file: Option<&PathBuf>) -> Result<()> {
    let games = load(file, true)??;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", games.to_sgf())?;
    Ok(())
}

fn run_board(file: Option<&PathBuf>, game: usize, path: Option<Path>) -> Result<()> {
    let games = load(file, false)??;
    let mut nav = games
        .nav(game)
        .ok_or_else(|| anyhow!("no game {game} (collection has {})", games.len()))?;
    match path {
        Some(path) => {
            if !nav.update(path.clone()) {
                return Err(anyhow!("no node at path {path}"));
            }
        }
        None => {
            nav.last();
        }
    }
    let at = nav.path().clone();
    let board = nav.board()?;
    let (black, white) = board.captures();
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{board}")?;
    writeln!(
        stdout,
        "node {at}, {} to play, captures B {black} W {white}",
        board.next_player().letter()
    )?;
    Ok(())
}
