use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::AppError;
use crate::models::{OrderSidecar, ORDER_FILE};
use crate::services::PieceStore;

/// Write a seeded random presentation order for the pieces in `store`.
///
/// The piece files are left untouched; solvers never read the order.
pub fn shuffle_pieces(store: &PieceStore, seed: u64) -> Result<OrderSidecar, AppError> {
    let mut names = store.piece_names()?;
    if names.is_empty() {
        return Err(AppError::ResourceMissing(format!(
            "no piece_*.png files in {}",
            store.dir().display()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    names.shuffle(&mut rng);
    let order = OrderSidecar(names);
    store.write_sidecar(ORDER_FILE, &order)?;

    tracing::info!(pieces = order.0.len(), seed, "Shuffled presentation order");
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tessera::{Piece, Raster};

    fn store_with(dir: &TempDir, n: usize) -> PieceStore {
        let store = PieceStore::new(dir.path());
        let pieces: Vec<Piece> = (0..n)
            .map(|i| Piece::new(tessera::piece_name(i), Raster::new(1, 1)))
            .collect();
        store.write_pieces(&pieces).unwrap();
        store
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, 12);
        let order = shuffle_pieces(&store, 7).unwrap();

        let mut sorted = order.0.clone();
        sorted.sort();
        assert_eq!(sorted, store.piece_names().unwrap());

        let saved: OrderSidecar = store.read_sidecar(ORDER_FILE).unwrap().unwrap();
        assert_eq!(saved, order);
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, 12);
        let a = shuffle_pieces(&store, 99).unwrap();
        let b = shuffle_pieces(&store, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_empty_directory() {
        let dir = TempDir::new().unwrap();
        let result = shuffle_pieces(&PieceStore::new(dir.path()), 1);
        assert!(matches!(result, Err(AppError::ResourceMissing(_))));
    }
}
