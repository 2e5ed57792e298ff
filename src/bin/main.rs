//! Command-line entry point: identifies the NTFS volume in a disk image.
//!
//! Usage: `main <image> [--offset N] [--bpb] [--layout] [-v...]`
//!
//! On success the probe result is printed as `ID_FS_*=value` lines and the exit status is 0.
//! The exit status is 1 when the image holds no NTFS volume at the given offset.

use log::{error, warn};
use ntfs_volume_id::ntfs::boot_sector::BootSector;
use ntfs_volume_id::traits::LayoutDisplay;
use ntfs_volume_id::{ImageReader, VolumeId, probe_ntfs};
use std::env;
use std::path::PathBuf;
use std::process;

/// Options collected from the command line.
struct RunConfig {
    /// The disk image or block device to probe.
    image: PathBuf,
    /// Byte offset of the volume within the image.
    offset: u64,
    /// Dump the boot sector fields.
    bpb: bool,
    /// Print the volume layout.
    layout: bool,
    /// Log verbosity, raised by each `-v`.
    verbosity: usize,
}

impl RunConfig {
    fn from_args(args: &[String]) -> Result<Self, String> {
        let mut image = None;
        let mut offset = 0;
        let mut bpb = false;
        let mut layout = false;
        let mut verbosity = 0;

        let mut args = args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--offset" => match args.next() {
                    Some(value) => offset = parse_offset(value)?,
                    None => return Err(String::from("Missing arg: '--offset' expects a byte offset.")),
                },
                "--bpb" => bpb = true,
                "--layout" => layout = true,
                flag if flag.starts_with("-v") && flag[1..].chars().all(|c| c == 'v') => {
                    verbosity += flag.len() - 1;
                }
                flag if flag.starts_with('-') => return Err(format!("Unknown option: {flag:?}")),
                path => {
                    if image.replace(PathBuf::from(path)).is_some() {
                        return Err(String::from("Only one image can be probed at a time."));
                    }
                }
            }
        }

        Ok(Self {
            image: image.ok_or_else(|| String::from("Please provide the path to a disk image."))?,
            offset,
            bpb,
            layout,
            verbosity,
        })
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal byte offset.
fn parse_offset(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };

    parsed.map_err(|err| format!("Arg parsing error: invalid offset {s:?}: {err}"))
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let config = RunConfig::from_args(&args).unwrap_or_else(|e| {
        eprintln!("{e}");
        eprintln!("Usage: main <image> [--offset N] [--bpb] [--layout] [-v...]");
        process::exit(2);
    });

    if let Err(e) = stderrlog::new()
        .module(module_path!())
        .module("ntfs_volume_id")
        .verbosity(config.verbosity)
        .init()
    {
        eprintln!("Failed to initialize logging: {e}");
    }

    let reader = match ImageReader::open(&config.image) {
        Ok(reader) => reader,
        Err(err) => {
            error!("Can't open {}: {}", config.image.display(), err);
            process::exit(1);
        }
    };

    if config.bpb || config.layout {
        match BootSector::from_reader(&reader, config.offset) {
            Ok(boot_sector) => {
                if config.bpb {
                    println!("{boot_sector}\n");
                }
                if config.layout {
                    println!("{}", boot_sector.display_layout(3));
                }
            }
            Err(err) => warn!("Boot sector unavailable: {err}"),
        }
    }

    let mut id = VolumeId::new();
    match probe_ntfs(&reader, config.offset, &mut id) {
        Ok(()) => println!("{id}"),
        Err(err) => {
            warn!(
                "No NTFS volume in {} at offset {}: {}",
                config.image.display(),
                config.offset,
                err
            );
            process::exit(1);
        }
    }
}
