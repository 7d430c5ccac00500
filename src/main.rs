use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pieceworks::models::{AppConfig, CONFIG_ENV_VAR};
use pieceworks::services::{
    shuffle_pieces, verify_coverage, PieceStore, RebuildService, ShatterMode, ShatterService,
};

/// Voronoi piece count when neither `--pieces` nor `--grid` is given
const DEFAULT_PIECES: usize = 50;

/// Seed for shatter runs without `--seed`
const DEFAULT_SEED: u64 = 42;

#[derive(Parser)]
#[command(name = "pieceworks")]
#[command(about = "Shatter images into Voronoi or jigsaw pieces and rebuild them")]
struct Cli {
    /// Config file (default: $PIECEWORKS_CONFIG, then ./pieceworks.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Cut an image into pieces
    Shatter {
        /// Source PNG image
        image: PathBuf,

        /// Directory for the pieces and sidecars
        #[arg(short, long)]
        output: PathBuf,

        /// Number of Voronoi pieces
        #[arg(short, long, conflicts_with = "grid")]
        pieces: Option<usize>,

        /// Interlocking jigsaw grid, e.g. "5x10" for 5 rows and 10 columns
        #[arg(short, long, value_parser = parse_grid)]
        grid: Option<(usize, usize)>,

        /// Random seed
        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Reassemble a piece directory into one image
    Rebuild {
        /// Directory holding piece_XX.png files and optional sidecars
        pieces_dir: PathBuf,

        /// Directory for the reconstruction
        #[arg(short, long)]
        output: PathBuf,

        /// Candidates tried per cell (overrides rebuild.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Jigsaw grid of a piece set without pieces_layout.json, e.g. "5x10"
        #[arg(short, long, value_parser = parse_grid)]
        grid: Option<(usize, usize)>,
    },
    /// Write a random presentation order for a piece directory
    Shuffle {
        /// Directory holding piece_XX.png files
        pieces_dir: PathBuf,

        /// Random seed (random when omitted)
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Check that Voronoi pieces cover their source image exactly once
    Verify {
        /// Source PNG image
        image: PathBuf,

        /// Directory holding piece_XX.png files
        pieces_dir: PathBuf,

        /// Write a coverage image: gaps red, overlaps green
        #[arg(long)]
        visualize: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        run_status_command(cli.config.as_deref());
        return Ok(());
    };

    init_tracing(cli.verbose);
    let config_path = AppConfig::resolve_path(cli.config.as_deref());
    let config = AppConfig::load(&config_path)?;

    match command {
        Commands::Shatter {
            image,
            output,
            pieces,
            grid,
            seed,
        } => run_shatter_command(config, &image, &output, pieces, grid, seed),
        Commands::Rebuild {
            pieces_dir,
            output,
            top_k,
            grid,
        } => run_rebuild_command(config, &pieces_dir, &output, top_k, grid),
        Commands::Shuffle { pieces_dir, seed } => run_shuffle_command(&pieces_dir, seed),
        Commands::Verify {
            image,
            pieces_dir,
            visualize,
        } => run_verify_command(&image, &pieces_dir, visualize.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "pieceworks=debug,tessera=debug"
    } else {
        "pieceworks=info,tessera=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

/// Parse "RxC" (also "R,C" or "RXC") into rows and columns.
fn parse_grid(s: &str) -> Result<(usize, usize), String> {
    let (rows, cols) = s
        .split_once(['x', 'X', ','])
        .ok_or_else(|| format!("expected ROWSxCOLS, got {s:?}"))?;
    let rows: usize = rows
        .trim()
        .parse()
        .map_err(|e| format!("bad row count {rows:?}: {e}"))?;
    let cols: usize = cols
        .trim()
        .parse()
        .map_err(|e| format!("bad column count {cols:?}: {e}"))?;
    if rows == 0 || cols == 0 {
        return Err(format!("grid must have at least one row and column, got {s:?}"));
    }
    Ok((rows, cols))
}

fn run_shatter_command(
    config: AppConfig,
    image: &Path,
    output: &Path,
    pieces: Option<usize>,
    grid: Option<(usize, usize)>,
    seed: u64,
) -> anyhow::Result<()> {
    let mode = match (pieces, grid) {
        (_, Some((rows, cols))) => ShatterMode::Jigsaw { rows, cols },
        (pieces, None) => ShatterMode::Voronoi {
            pieces: pieces.unwrap_or(DEFAULT_PIECES),
        },
    };

    let report = ShatterService::new(config.shatter).shatter_file(image, output, mode, seed)?;

    println!("Wrote {} pieces to {}", report.pieces, output.display());
    if let Some(layout) = report.layout {
        println!(
            "Grid {}x{}, body {}x{} px, tab radius {} px",
            layout.rows, layout.cols, layout.piece_width, layout.piece_height, layout.tab_radius
        );
    }
    Ok(())
}

fn run_rebuild_command(
    mut config: AppConfig,
    pieces_dir: &Path,
    output: &Path,
    top_k: Option<usize>,
    grid: Option<(usize, usize)>,
) -> anyhow::Result<()> {
    if let Some(k) = top_k {
        config.rebuild.top_k = k;
        config.validate()?;
    }

    let mut service = RebuildService::new(config.rebuild);
    if let Some((rows, cols)) = grid {
        service = service.grid(rows, cols);
    }
    let report = service.rebuild_dir(pieces_dir, output)?;

    println!(
        "Rebuilt {} pieces ({:?}) into {} ({}x{})",
        report.pieces,
        report.mode,
        report.output.display(),
        report.width,
        report.height
    );
    if report.coverage.uncovered > 0 {
        println!(
            "  {} pixels left blank by empty grid cells",
            report.coverage.uncovered
        );
    }
    Ok(())
}

fn run_shuffle_command(pieces_dir: &Path, seed: Option<u64>) -> anyhow::Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    let order = shuffle_pieces(&PieceStore::new(pieces_dir), seed)?;
    println!(
        "Shuffled {} pieces in {} (seed {seed})",
        order.0.len(),
        pieces_dir.display()
    );
    Ok(())
}

fn run_verify_command(
    image: &Path,
    pieces_dir: &Path,
    visualize: Option<&Path>,
) -> anyhow::Result<()> {
    let report = verify_coverage(image, &PieceStore::new(pieces_dir), visualize)?;

    println!("Total pixels:      {}", report.total);
    println!("Uncovered pixels:  {}", report.uncovered);
    println!("Overlapped pixels: {}", report.overlapped);
    if let Some(path) = visualize {
        println!("Coverage view:     {}", path.display());
    }

    if report.is_exact() {
        println!("\nSUCCESS: every pixel is covered by exactly one piece");
        Ok(())
    } else {
        anyhow::bail!(
            "coverage is not exact: {} uncovered, {} overlapped",
            report.uncovered,
            report.overlapped
        )
    }
}

fn run_status_command(config_flag: Option<&Path>) {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let env_config = std::env::var(CONFIG_ENV_VAR).ok();
    let config_path = AppConfig::resolve_path(config_flag);

    // Header
    println!("Pieceworks v{VERSION}");
    println!("Shatter images into puzzles and put them back together\n");

    // Environment variables section
    println!("Environment Variables:");
    println!(
        "  {CONFIG_ENV_VAR} = {}",
        env_config.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  RUST_LOG          = {}",
        std::env::var("RUST_LOG").as_deref().unwrap_or("(not set)")
    );

    // Config section
    println!("\nConfiguration:");
    let config = if config_path.exists() {
        match AppConfig::load(&config_path) {
            Ok(config) => {
                println!("  Source:  {}", config_path.display());
                config
            }
            Err(e) => {
                println!("  Source:  {} (invalid: {e})", config_path.display());
                AppConfig::default()
            }
        }
    } else {
        println!("  Source:  defaults ({} not found)", config_path.display());
        AppConfig::default()
    };
    println!(
        "  Shatter: {} Lloyd iterations, {:?} seeding, tab ratio {}",
        config.shatter.lloyd_iterations, config.shatter.seeding, config.shatter.tab_ratio
    );
    println!(
        "  Rebuild: top-k {}, breadth-first from {} pieces, output {}",
        config.rebuild.top_k, config.rebuild.bfs_threshold, config.rebuild.output_name
    );

    // Commands section
    println!("\nCommands:");
    println!("  pieceworks shatter   Cut an image into Voronoi or jigsaw pieces");
    println!("  pieceworks rebuild   Reassemble a piece directory");
    println!("  pieceworks shuffle   Write a random presentation order");
    println!("  pieceworks verify    Check coverage of Voronoi pieces");
    println!("\nRun 'pieceworks --help' for more details.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grid() {
        assert_eq!(parse_grid("5x10"), Ok((5, 10)));
        assert_eq!(parse_grid("2X3"), Ok((2, 3)));
        assert_eq!(parse_grid("4,4"), Ok((4, 4)));
        assert!(parse_grid("0x3").is_err());
        assert!(parse_grid("five").is_err());
        assert!(parse_grid("3x").is_err());
    }

    #[test]
    fn test_cli_pieces_conflict_with_grid() {
        let result = Cli::try_parse_from([
            "pieceworks", "shatter", "in.png", "-o", "out", "--pieces", "9", "--grid", "2x3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_shatter_defaults() {
        let cli = Cli::try_parse_from(["pieceworks", "shatter", "in.png", "-o", "out"]).unwrap();
        match cli.command {
            Some(Commands::Shatter {
                pieces, grid, seed, ..
            }) => {
                assert_eq!((pieces, grid, seed), (None, None, 42));
            }
            _ => panic!("Expected shatter command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pieceworks", "rebuild", "pieces", "-o", "out", "-k", "8", "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Rebuild { top_k, .. }) => assert_eq!(top_k, Some(8)),
            _ => panic!("Expected rebuild command"),
        }
    }

    #[test]
    fn test_cli_rebuild_grid() {
        let cli =
            Cli::try_parse_from(["pieceworks", "rebuild", "pieces", "-o", "out", "--grid", "3x4"])
                .unwrap();
        match cli.command {
            Some(Commands::Rebuild { grid, top_k, .. }) => {
                assert_eq!((grid, top_k), (Some((3, 4)), None))
            }
            _ => panic!("Expected rebuild command"),
        }
    }
}
