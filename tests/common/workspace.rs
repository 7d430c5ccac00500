//! Temporary directory layout for shatter and rebuild runs.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use pieceworks::models::AppConfig;
use pieceworks::rendering::{read_png, write_png};
use pieceworks::services::{PieceStore, RebuildService, ShatterService};
use tessera::Raster;

/// A temp directory with a source image, a piece directory and an output
/// directory, plus services built from one config
pub struct TestWorkspace {
    dir: TempDir,
    pub config: AppConfig,
}

impl TestWorkspace {
    /// Create an empty workspace with default configuration
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            config: AppConfig::default(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_path(&self) -> PathBuf {
        self.root().join("source.png")
    }

    pub fn pieces_dir(&self) -> PathBuf {
        self.root().join("pieces")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("out")
    }

    pub fn store(&self) -> PieceStore {
        PieceStore::new(self.pieces_dir())
    }

    /// Write `image` as the source PNG
    pub fn write_source(&self, image: &Raster) -> PathBuf {
        let path = self.source_path();
        write_png(&path, image, false).expect("Failed to write source image");
        path
    }

    pub fn shatter_service(&self) -> ShatterService {
        ShatterService::new(self.config.shatter.clone())
    }

    pub fn rebuild_service(&self) -> RebuildService {
        RebuildService::new(self.config.rebuild.clone())
    }

    /// Decode the reconstruction written by a rebuild
    pub fn read_output(&self) -> Raster {
        read_png(&self.output_dir().join(&self.config.rebuild.output_name))
            .expect("Failed to read reconstruction")
    }
}
