pub mod coverage_view;
pub mod png_codec;

pub use coverage_view::{coverage_counts, render_coverage};
pub use png_codec::{decode_png, encode_png, optimize_png, read_png, write_png};
