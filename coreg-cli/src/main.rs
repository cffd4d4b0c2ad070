mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use coreg::{Error, FitMode, GridTable, Role, Session, SizeCheck};

use crate::config::{FixedSource, MovingSource, SessionFile};

#[derive(Parser)]
#[command(name = "coreg")]
#[command(about = "Landmark-based affine registration of EBSD and Raman scan rasters")]
struct Cli {
    /// Base log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Also write daily-rolling log files into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a registration session described by a YAML or JSON file
    Register {
        #[arg(short, long)]
        session: PathBuf,
    },
    /// Print the header and size reconciliation of an .ang grid file
    InspectGrid { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    common::log_setup::setup_logging(&cli.log_level, cli.log_dir.as_deref())?;

    match &cli.command {
        Command::Register { session } => register(session),
        Command::InspectGrid { path } => inspect_grid(path),
    }
}

fn register(session_path: &Path) -> Result<()> {
    let file = SessionFile::load(session_path)?;
    tracing::info!("Running session {}", session_path.display());
    let mut session = Session::new();

    match &file.fixed {
        FixedSource::Grid(path) => {
            let check = session
                .load_fixed_grid(path)
                .with_context(|| format!("Failed to load fixed grid {}", path.display()))?;
            if let SizeCheck::RowTrimmed {
                declared_rows,
                used_rows,
            } = check
            {
                println!("Fixed grid: NROWS corrected from {declared_rows} to {used_rows}");
            }
        }
        FixedSource::Image(path) => session
            .load_fixed_image(path)
            .with_context(|| format!("Failed to load fixed image {}", path.display()))?,
    }

    match &file.moving {
        MovingSource::Image(path) => session
            .load_moving_image(path)
            .with_context(|| format!("Failed to load moving image {}", path.display()))?,
        MovingSource::Scan(scan) => {
            let auxiliary: Vec<&str> = scan.auxiliary.iter().map(String::as_str).collect();
            session
                .load_moving_scan(
                    &scan.path,
                    &scan.x_column,
                    &scan.y_column,
                    &scan.primary,
                    &auxiliary,
                )
                .with_context(|| format!("Failed to load moving scan {}", scan.path.display()))?;
        }
    }

    for (role, points) in [
        (Role::Fixed, file.points.fixed()),
        (Role::Moving, file.points.moving()),
    ] {
        for p in points {
            session.add_point(role, p.x, p.y);
        }
    }

    let mode = file.fit_mode();
    let readiness = session.readiness(&mode);
    if !readiness.can_fit() {
        bail!("Not enough points to fit: {readiness:?}");
    }

    let result = session.register(&mode)?;
    let d = &result.decomposition;
    println!("Transform: {}", result.transform);
    println!(
        "  rotation {:.3} deg, scale {:.4} (x {:.4}, y {:.4}), translation ({:.2}, {:.2})",
        d.rotation_deg, d.scale, d.scale_x, d.scale_y, d.translation.x, d.translation.y
    );
    println!(
        "  {} of {} pairs inliers, RMS {:.3} px, max {:.3} px",
        result.num_inliers(),
        result.residuals.len(),
        result.rms_error,
        result.max_error
    );
    if let FitMode::Robust(_) = mode {
        println!("  {} samples evaluated", result.iterations);
    }

    session.apply(&file.warp)?;
    session.overlay(file.overlay_weight)?;
    let written = session
        .export(&file.output)
        .with_context(|| format!("Failed to export to {}", file.output.display()))?;

    for path in &written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn inspect_grid(path: &Path) -> Result<()> {
    let table = GridTable::read(path)?;

    println!("{}", path.display());
    for key in coreg::grid::HEADER_KEYS {
        match table.header().get(key) {
            Some(value) => println!("  {key:<10} {value}"),
            None => println!("  {key:<10} (missing)"),
        }
    }
    println!("  data rows  {}", table.rows().len());
    if table.skipped_rows() > 0 {
        println!("  skipped    {} non-numeric rows", table.skipped_rows());
    }

    match table.into_raster() {
        Ok(parsed) => {
            let (rows, cols) = parsed.raster.shape();
            match parsed.size_check {
                SizeCheck::Exact => println!("  grid       {rows} x {cols} (exact)"),
                SizeCheck::RowTrimmed { declared_rows, .. } => {
                    println!("  grid       {rows} x {cols} (NROWS corrected from {declared_rows})")
                }
            }
            Ok(())
        }
        Err(Error::SizeMismatch {
            expected, actual, ..
        }) => {
            println!("  grid       mismatch: {expected} samples declared, {actual} present");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
