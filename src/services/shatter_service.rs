use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

use tessera::{GridLayout, JigsawPartitioner, Piece, Raster, VoronoiPartitioner};

use crate::error::AppError;
use crate::models::{EdgeSidecar, LayoutSidecar, ShatterConfig, EDGES_FILE, LAYOUT_FILE};
use crate::rendering::read_png;
use crate::services::PieceStore;

/// Which partitioner cuts the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShatterMode {
    /// `pieces` irregular full-canvas regions
    Voronoi { pieces: usize },
    /// Interlocking rows×cols grid with edge and layout sidecars
    Jigsaw { rows: usize, cols: usize },
}

/// What a shatter run produced
#[derive(Debug, Clone)]
pub struct ShatterReport {
    pub pieces: usize,
    /// Opaque pixels over all pieces
    pub area: usize,
    /// Set for jigsaw runs
    pub layout: Option<GridLayout>,
}

/// Cuts images into pieces and writes them with their sidecars.
pub struct ShatterService {
    config: ShatterConfig,
}

impl ShatterService {
    pub fn new(config: ShatterConfig) -> Self {
        Self { config }
    }

    /// Shatter a PNG file into `output_dir`.
    pub fn shatter_file(
        &self,
        image_path: &Path,
        output_dir: &Path,
        mode: ShatterMode,
        seed: u64,
    ) -> Result<ShatterReport, AppError> {
        let image = read_png(image_path)?;
        tracing::info!(
            image = %image_path.display(),
            width = image.width(),
            height = image.height(),
            "Loaded source image"
        );
        self.shatter(&image, mode, seed, &PieceStore::new(output_dir))
    }

    /// Cut `image` and write the result to `store`.
    ///
    /// Partitioning finishes before the directory is touched, so invalid
    /// input leaves an existing directory as it was.
    pub fn shatter(
        &self,
        image: &Raster,
        mode: ShatterMode,
        seed: u64,
        store: &PieceStore,
    ) -> Result<ShatterReport, AppError> {
        let mut rng = StdRng::seed_from_u64(seed);

        let (pieces, sidecars) = match mode {
            ShatterMode::Voronoi { pieces } => {
                let partition = VoronoiPartitioner::new()
                    .lloyd_iterations(self.config.lloyd_iterations)
                    .seeding(self.config.seeding.into())
                    .generate(image, pieces, &mut rng)?;
                (partition.pieces, None)
            }
            ShatterMode::Jigsaw { rows, cols } => {
                let puzzle = JigsawPartitioner::new()
                    .tab_ratio(self.config.tab_ratio)
                    .generate(image, rows, cols, &mut rng)?;
                let edges = EdgeSidecar::from_puzzle(&puzzle);
                let layout = puzzle.layout;
                (puzzle.pieces, Some((edges, layout)))
            }
        };

        store.clear()?;
        store.write_pieces(&pieces)?;
        let layout = match sidecars {
            Some((edges, layout)) => {
                store.write_sidecar(EDGES_FILE, &edges)?;
                store.write_sidecar(LAYOUT_FILE, &LayoutSidecar::from(layout))?;
                Some(layout)
            }
            None => None,
        };

        tracing::info!(
            pieces = pieces.len(),
            seed,
            dir = %store.dir().display(),
            "Shattered image"
        );
        Ok(ShatterReport {
            pieces: pieces.len(),
            area: total_area(&pieces),
            layout,
        })
    }
}

/// Total opaque area of a piece set.
pub fn total_area(pieces: &[Piece]) -> usize {
    pieces.iter().map(Piece::area).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tessera::PuzzleError;

    #[test]
    fn test_invalid_count_leaves_directory_alone() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("piece_00.png");
        std::fs::write(&marker, b"old").unwrap();

        let image = Raster::filled(4, 4, [1, 2, 3, 255]);
        let result = ShatterService::new(ShatterConfig::default()).shatter(
            &image,
            ShatterMode::Voronoi { pieces: 0 },
            1,
            &PieceStore::new(dir.path()),
        );

        assert!(matches!(
            result,
            Err(AppError::Puzzle(PuzzleError::InputInvalid(_)))
        ));
        assert_eq!(std::fs::read(&marker).unwrap(), b"old");
    }

    #[test]
    fn test_voronoi_writes_no_sidecars() {
        let dir = TempDir::new().unwrap();
        let store = PieceStore::new(dir.path());
        let image = Raster::filled(30, 20, [9, 9, 9, 255]);
        let report = ShatterService::new(ShatterConfig::default())
            .shatter(&image, ShatterMode::Voronoi { pieces: 4 }, 3, &store)
            .unwrap();

        assert_eq!(report.pieces, 4);
        assert_eq!(report.area, 600);
        assert!(report.layout.is_none());
        assert!(!dir.path().join(EDGES_FILE).exists());
        assert_eq!(total_area(&store.load_pieces().unwrap()), 600);
    }

    #[test]
    fn test_jigsaw_replaces_stale_pieces() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("piece_42.png"), b"stale").unwrap();
        let store = PieceStore::new(dir.path());
        let image = Raster::filled(40, 40, [9, 9, 9, 255]);
        let report = ShatterService::new(ShatterConfig::default())
            .shatter(&image, ShatterMode::Jigsaw { rows: 2, cols: 2 }, 3, &store)
            .unwrap();

        assert_eq!(report.layout.map(|l| l.len()), Some(4));
        assert_eq!(store.piece_names().unwrap().len(), 4);
        assert!(dir.path().join(LAYOUT_FILE).exists());
    }
}
