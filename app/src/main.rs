use std::io::Write;
use std::path::PathBuf;
use std::process::exit;

use chrono::Local;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use scan_converter::{convert, ConvertOptions};
use scan_reader::{E57ScanReader, ScanReader};

#[derive(Parser, Debug)]
#[command(
    name = "scan2las",
    about = "A tool for converting E57 scan containers into LAS/LAZ point streams",
    version = "0.0.1"
)]
struct Cli {
    /// Input E57 file
    #[arg(short, long, required = true, value_name = "FILE")]
    input: String,

    /// Output LAS/LAZ file; defaults to the input name with a .las extension
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Write one output file per scan instead of merging
    #[arg(long, visible_alias = "split-scans")]
    split: bool,

    /// Convert only the given 1-based scan numbers
    #[arg(long, num_args = 1.., value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    scan: Vec<u32>,

    /// Coordinate scale factors
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = vec![0.001, 0.001, 0.001])]
    set_scale: Vec<f64>,

    /// Do not apply scan translations
    #[arg(long)]
    no_translation: bool,

    /// Do not apply scan rotations
    #[arg(long)]
    no_rotation: bool,

    /// Do not apply scan poses at all
    #[arg(long)]
    no_pose: bool,

    /// Write points the source flagged as invalid
    #[arg(long)]
    include_invalid: bool,

    /// Print the number of scans in the input and exit
    #[arg(long)]
    print_scan_count: bool,

    /// Number of cores for batch processing (reserved, currently ignored)
    #[arg(long, value_name = "N", hide = true)]
    cores: Option<u32>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Cli::parse();

    let level = if args.print_scan_count {
        LevelFilter::Off
    } else {
        match args.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .init();

    if args.cores.is_some() {
        log::warn!("multi-core batching is not implemented. ignoring '--cores' ...");
    }

    let input = PathBuf::from(&args.input);
    if !input.is_file() {
        log::error!("file '{}' does not exist", input.display());
        exit(1);
    }

    let mut reader = match E57ScanReader::open(&input) {
        Ok(reader) => reader,
        Err(e) => {
            log::error!("{}", e);
            exit(1);
        }
    };

    if args.print_scan_count {
        println!("{}", reader.scan_count());
        return;
    }

    let output = args
        .output
        .map(PathBuf::from)
        .unwrap_or_else(|| input.with_extension("las"));

    let mut options = ConvertOptions::new(output);
    options.split_scans = args.split;
    options.scale = [args.set_scale[0], args.set_scale[1], args.set_scale[2]];
    options.apply_rotation = !(args.no_rotation || args.no_pose);
    options.apply_translation = !(args.no_translation || args.no_pose);
    options.include_invalid = args.include_invalid;
    options.scans = args.scan;

    let start = std::time::Instant::now();
    match convert(&mut reader, &options) {
        Ok(stats) => {
            if stats.invalid_points > 0 {
                log::info!(
                    "scans of '{}' contain {} invalid points that were {}",
                    input.display(),
                    stats.invalid_points,
                    if options.include_invalid {
                        "included"
                    } else {
                        "omitted"
                    }
                );
            }
            if stats.scans_skipped > 0 {
                log::info!("{} scan(s) were skipped", stats.scans_skipped);
            }
            log::info!(
                "written a total of {} points in {:?}",
                stats.points_written,
                start.elapsed()
            );
        }
        Err(e) => {
            log::error!("processing '{}': {}", input.display(), e);
            exit(1);
        }
    }
}
