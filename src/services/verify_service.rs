use std::path::Path;

use tessera::{CoverageReport, PuzzleError};

use crate::error::AppError;
use crate::rendering::{coverage_counts, read_png, render_coverage, write_png};
use crate::services::PieceStore;

/// Check that the full-canvas pieces in `store` cover the source image at
/// `image_path` exactly once, optionally writing a coverage view (gaps red,
/// overlaps green) to `visualize`.
pub fn verify_coverage(
    image_path: &Path,
    store: &PieceStore,
    visualize: Option<&Path>,
) -> Result<CoverageReport, AppError> {
    let image = read_png(image_path)?;
    let (width, height) = (image.width(), image.height());
    let pieces = store.load_pieces()?;

    if let Some(odd) = pieces
        .iter()
        .find(|p| (p.raster.width(), p.raster.height()) != (width, height))
    {
        return Err(PuzzleError::InputInvalid(format!(
            "{} is {}x{}, source image is {width}x{height}",
            odd.name,
            odd.raster.width(),
            odd.raster.height()
        ))
        .into());
    }

    let counts = coverage_counts(&pieces, width, height);
    let report = CoverageReport::from_counts(&counts);

    if let Some(path) = visualize {
        write_png(path, &render_coverage(&counts, width, height), false)?;
        tracing::info!(path = %path.display(), "Wrote coverage view");
    }

    tracing::info!(
        pieces = pieces.len(),
        total = report.total,
        uncovered = report.uncovered,
        overlapped = report.overlapped,
        "Verified coverage"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tessera::{Piece, Raster};

    use crate::rendering::coverage_view::{COVERED, GAP};

    #[test]
    fn test_reports_gap_and_writes_view() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.png");
        write_png(&source, &Raster::filled(2, 1, [5, 5, 5, 255]), false).unwrap();

        let mut half = Raster::new(2, 1);
        half.put(0, 0, [5, 5, 5, 255]);
        let pieces_dir = dir.path().join("pieces");
        let store = PieceStore::new(&pieces_dir);
        store.write_pieces(&[Piece::new("piece_00.png", half)]).unwrap();

        let view = dir.path().join("coverage.png");
        let report = verify_coverage(&source, &store, Some(&view)).unwrap();
        assert_eq!((report.total, report.uncovered, report.overlapped), (2, 1, 0));

        let rendered = read_png(&view).unwrap();
        assert_eq!(rendered.get(0, 0), COVERED);
        assert_eq!(rendered.get(1, 0), GAP);
    }

    #[test]
    fn test_rejects_mismatched_piece_size() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.png");
        write_png(&source, &Raster::filled(4, 4, [5, 5, 5, 255]), false).unwrap();
        let store = PieceStore::new(dir.path().join("pieces"));
        store
            .write_pieces(&[Piece::new("piece_00.png", Raster::new(2, 2))])
            .unwrap();

        let result = verify_coverage(&source, &store, None);
        assert!(matches!(
            result,
            Err(AppError::Puzzle(PuzzleError::InputInvalid(_)))
        ));
    }
}
