use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use log::{debug, LevelFilter};
use miette::{IntoDiagnostic, NamedSource, Result};

use hackasm::output::{binary_path, write_lines};
use hackasm::{to_bin_string, Air};

/// hackasm translates Hack assembly into the 16-bit binary listings run by the Hack CPU.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` file to assemble
    path: Option<PathBuf>,

    /// Log more about each pass (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Create binary `.hack` file from a `.asm` source
    Compile {
        /// `.asm` file to compile
        name: PathBuf,
        /// Destination to output .hack file
        dest: Option<PathBuf>,
        /// Print every instruction next to its binary encoding
        #[arg(short, long)]
        listing: bool,
    },
    /// Check a `.asm` file without outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Remove compilation artifacts for specified source
    Clean {
        /// `.asm` file to remove artifacts for
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    initialize_logging(args.verbose);

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(hackasm::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    match (args.command, args.path) {
        (Some(Command::Compile {
            name,
            dest,
            listing,
        }), _) => compile(&name, dest, listing),
        (Some(Command::Check { name }), _) => {
            file_message(Green, "Checking", &name);
            let _ = assemble_file(&name)?;
            message(Green, "Success", "no errors found!");
            Ok(())
        }
        (Some(Command::Clean { name }), _) => {
            let artifact = binary_path(&name);
            if artifact.exists() {
                fs::remove_file(&artifact).into_diagnostic()?;
                file_message(Green, "Removed", &artifact);
            } else {
                message(Cyan, "Clean", "nothing to remove");
            }
            Ok(())
        }
        (None, Some(path)) => compile(&path, None, false),
        (None, None) => {
            println!("\n~ hackasm v{VERSION} ~");
            println!("{SHORT_INFO}");
            Ok(())
        }
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, right.as_str());
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn compile(name: &Path, dest: Option<PathBuf>, listing: bool) -> Result<()> {
    file_message(MsgColor::Green, "Assembling", name);
    let (air, words) = assemble_file(name)?;

    if listing {
        print_listing(&air, &words);
    }

    let out_file_name = dest.unwrap_or_else(|| binary_path(name));
    write_lines(&out_file_name, words.iter().copied().map(to_bin_string)).into_diagnostic()?;

    message(MsgColor::Green, "Finished", "emit binary");
    file_message(MsgColor::Green, "Saved", &out_file_name);
    Ok(())
}

/// Run the whole pipeline over a source file, reporting errors against its contents.
fn assemble_file(name: &Path) -> Result<(Air, Vec<u16>)> {
    let contents = fs::read_to_string(name).into_diagnostic()?;
    debug!("read {} bytes from {}", contents.len(), name.display());
    let res = hackasm::assemble(&contents).and_then(|air| {
        let words = air.emit()?;
        Ok((air, words))
    });
    res.map_err(|e| e.with_source_code(NamedSource::new(name.display().to_string(), contents)))
}

fn print_listing(air: &Air, words: &[u16]) {
    for (pc, (stmt, word)) in air.into_iter().zip(words).enumerate() {
        let labels = air
            .labels()
            .iter()
            .filter(|label| label.pc as usize == pc)
            .map(|label| format!("({})", label.name))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:>5}  {:<16} {:<20} {}",
            pc.to_string().cyan(),
            labels,
            stmt.to_string(),
            to_bin_string(*word)
        );
    }
}

fn initialize_logging(verbosity: u8) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .chain(std::io::stderr())
        .apply()
        .ok();
}

const SHORT_INFO: &str = r"
Welcome to hackasm, an assembler for the Hack computer.
Run `hackasm <FILE>.asm` to produce `<FILE>.hack`.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
