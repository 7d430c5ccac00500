use std::io::Cursor;
use std::path::Path;

use tessera::Raster;

use crate::error::AppError;

/// Decode any PNG into an RGBA raster.
///
/// Palette and low bit depths are expanded and 16-bit channels stripped,
/// so every input ends up as 8-bit RGBA. Images without alpha become fully
/// opaque.
pub fn decode_png(bytes: &[u8]) -> Result<Raster, AppError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| AppError::ImageDecode(e.to_string()))?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| AppError::ImageDecode(e.to_string()))?;
    let data = &buf[..info.buffer_size()];

    if info.bit_depth != png::BitDepth::Eight {
        return Err(AppError::ImageDecode(format!(
            "unexpected bit depth {:?} after expansion",
            info.bit_depth
        )));
    }

    let rgba: Vec<u8> = match info.color_type {
        png::ColorType::Rgba => data.to_vec(),
        png::ColorType::Rgb => data
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => data
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => data.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        png::ColorType::Indexed => {
            return Err(AppError::ImageDecode(
                "palette image was not expanded".to_string(),
            ))
        }
    };

    Raster::from_rgba8(info.width, info.height, &rgba)
        .map_err(|e| AppError::ImageDecode(e.to_string()))
}

/// Encode an RGBA raster as PNG.
///
/// Uses fast settings; [`optimize_png`] re-compresses when size matters.
pub fn encode_png(raster: &Raster) -> Result<Vec<u8>, AppError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, raster.width(), raster.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        encoder.set_filter(png::FilterType::NoFilter);
        let mut writer = encoder
            .write_header()
            .map_err(|e| AppError::ImageEncode(e.to_string()))?;
        writer
            .write_image_data(&raster.to_rgba8())
            .map_err(|e| AppError::ImageEncode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

/// Re-compress PNG bytes with oxipng, keeping the input if that fails.
pub fn optimize_png(png_bytes: Vec<u8>) -> Vec<u8> {
    match oxipng::optimize_from_memory(
        &png_bytes,
        &oxipng::Options {
            strip: oxipng::StripChunks::Safe,
            optimize_alpha: false,
            ..Default::default()
        },
    ) {
        Ok(optimized) => optimized,
        Err(e) => {
            tracing::warn!(%e, "oxipng failed, keeping fast encoding");
            png_bytes
        }
    }
}

/// Read and decode a PNG file.
pub fn read_png(path: &Path) -> Result<Raster, AppError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::ResourceMissing(path.display().to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    decode_png(&bytes).map_err(|e| match e {
        AppError::ImageDecode(msg) => AppError::ImageDecode(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Encode a raster and write it to `path`.
pub fn write_png(path: &Path, raster: &Raster, optimize: bool) -> Result<(), AppError> {
    let mut bytes = encode_png(raster)?;
    if optimize {
        bytes = optimize_png(bytes);
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
