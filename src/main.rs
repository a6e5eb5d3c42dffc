use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use wallname::batch::{BatchReport, Renamer};
use wallname::config::{self, RenameConfig};
use wallname::imaging::RustBackend;
use wallname::{caption, logging, naming, output};

/// Directories shared by `rename` and `preview`.
#[derive(clap::Args, Clone)]
struct DirArgs {
    /// Directory of images to rename
    #[arg(long, default_value = "wallpapers")]
    source: PathBuf,

    /// Directory the renamed images are written to
    #[arg(long, default_value = "renamed")]
    output: PathBuf,

    /// Also write the full per-item report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "wallname")]
#[command(about = "Rename images into descriptive filenames derived from captions")]
#[command(long_about = "\
Rename images into descriptive filenames derived from captions

Each image is captioned, the caption is reduced to its content words and
fitted to a fixed length, and a date + counter suffix keeps names unique:

  wallpapers/IMG_0042.png   \"a cat sitting on the mat\"
    → renamed/cat-sitting-mat-wallpaper-290524_001.jpg

A failing image is reported and skipped; the rest of the batch continues.
Existing files in the output directory are never replaced unless
output.overwrite is set.

Run 'wallname gen-config' to generate a documented wallname.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./wallname.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log detail on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Caption, rename and write every image in the source directory
    Rename(DirArgs),
    /// Show the names a rename would produce without writing anything
    Preview(DirArgs),
    /// Print the name fragment a caption normalizes to
    Normalize {
        /// Caption text
        text: String,
    },
    /// Print a stock wallname.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Command::Rename(dirs) => {
            let config = config::load_config(cli.config.as_deref())?;
            run_batch(&config, &dirs)?;
        }
        Command::Preview(dirs) => {
            let mut config = config::load_config(cli.config.as_deref())?;
            config.dry_run = true;
            run_batch(&config, &dirs)?;
        }
        Command::Normalize { text } => {
            let config = config::load_config(cli.config.as_deref())?;
            println!("{}", naming::normalize(&text, &config.naming));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_batch(config: &RenameConfig, dirs: &DirArgs) -> Result<(), Box<dyn std::error::Error>> {
    let captioner = caption::from_config(&config.caption)?;
    let backend = RustBackend::new().overwrite(config.output.overwrite);
    let renamer = Renamer::new(config, captioner.as_ref(), &backend);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            println!("{}", output::format_rename_event(&event));
        }
    });
    let result = renamer.run(&dirs.source, &dirs.output, Some(tx));
    printer.join().ok();
    let report = result?;

    output::print_summary(&report, config.dry_run);
    if let Some(path) = &dirs.report {
        write_report(&report, path)?;
    }
    Ok(())
}

fn write_report(report: &BatchReport, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}
