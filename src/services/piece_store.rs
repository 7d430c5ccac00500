use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use tessera::Piece;

use crate::error::AppError;
use crate::models::{EDGES_FILE, LAYOUT_FILE, ORDER_FILE};
use crate::rendering::{encode_png, read_png};

/// A directory of `piece_XX.png` files and their JSON sidecars.
#[derive(Debug, Clone)]
pub struct PieceStore {
    dir: PathBuf,
}

impl PieceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the piece files, in piece index order.
    pub fn piece_names(&self) -> Result<Vec<String>, AppError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::ResourceMissing(format!(
                    "piece directory {}",
                    self.dir.display()
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_piece_file(name) {
                    names.push(name.to_string());
                }
            }
        }
        // piece_100.png sorts after piece_99.png
        names.sort_by_key(|name| (piece_index(name), name.clone()));
        Ok(names)
    }

    /// Decode every piece file in parallel, in piece index order.
    pub fn load_pieces(&self) -> Result<Vec<Piece>, AppError> {
        let names = self.piece_names()?;
        if names.is_empty() {
            return Err(AppError::ResourceMissing(format!(
                "no piece_*.png files in {}",
                self.dir.display()
            )));
        }

        let pieces = names
            .par_iter()
            .map(|name| read_png(&self.dir.join(name)).map(|raster| Piece::new(name.clone(), raster)))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(dir = %self.dir.display(), pieces = pieces.len(), "Loaded pieces");
        Ok(pieces)
    }

    /// Encode and write pieces under their own names.
    pub fn write_pieces(&self, pieces: &[Piece]) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir)?;
        pieces.par_iter().try_for_each(|piece| {
            let bytes = encode_png(&piece.raster)?;
            std::fs::write(self.dir.join(&piece.name), bytes)?;
            Ok::<(), AppError>(())
        })?;
        tracing::debug!(dir = %self.dir.display(), pieces = pieces.len(), "Wrote pieces");
        Ok(())
    }

    /// Remove piece files and sidecars left by an earlier run.
    ///
    /// Returns the number of files removed. A missing directory is empty.
    pub fn clear(&self) -> Result<usize, AppError> {
        let names = match self.piece_names() {
            Ok(names) => names,
            Err(AppError::ResourceMissing(_)) => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        for name in names
            .iter()
            .map(String::as_str)
            .chain([EDGES_FILE, LAYOUT_FILE, ORDER_FILE])
        {
            match std::fs::remove_file(self.dir.join(name)) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        if removed > 0 {
            tracing::debug!(dir = %self.dir.display(), removed, "Cleared stale pieces");
        }
        Ok(removed)
    }

    /// Parse a JSON sidecar; `None` when the file does not exist.
    pub fn read_sidecar<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, AppError> {
        let content = match std::fs::read_to_string(self.dir.join(file)) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| AppError::Sidecar(format!("{file}: {e}")))
    }

    /// Write a JSON sidecar.
    pub fn write_sidecar<T: Serialize>(&self, file: &str, value: &T) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(self.dir.join(file), json)?;
        Ok(())
    }
}

fn is_piece_file(name: &str) -> bool {
    name.starts_with("piece_") && name.ends_with(".png")
}

fn piece_index(name: &str) -> Option<usize> {
    name.strip_prefix("piece_")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
