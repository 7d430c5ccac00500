pub mod piece_store;
pub mod rebuild_service;
pub mod shatter_service;
pub mod shuffle_service;
pub mod verify_service;

pub use piece_store::PieceStore;
pub use rebuild_service::{Reconstruction, RebuildMode, RebuildReport, RebuildService};
pub use shatter_service::{ShatterMode, ShatterReport, ShatterService};
pub use shuffle_service::shuffle_pieces;
pub use verify_service::verify_coverage;
