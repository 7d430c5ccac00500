//! Finite Voronoi cells as convex polygons, and their rasterization.
//!
//! Each cell starts as a square of a synthetic bounding radius around the
//! site cloud and is clipped by the perpendicular-bisector half-plane of
//! every other site. Unbounded cells therefore end at the bounding square
//! instead of extending to infinity.

/// A point in pixel space (x right, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding radius for clipping unbounded cells: twice the larger extent of
/// the site cloud, never less than the image's width plus height so the
/// square always contains the whole image.
pub fn bounding_radius(sites: &[Point], width: u32, height: u32) -> f64 {
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in sites {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    let spread = (max_x - min_x).max(max_y - min_y);
    let spread = if spread.is_finite() { spread } else { 0.0 };
    (2.0 * spread).max(width as f64 + height as f64)
}

/// Clip a convex polygon to the half-plane `normal · p <= offset`.
///
/// Sutherland-Hodgman against a single edge.
pub fn clip_half_plane(polygon: &[Point], normal: Point, offset: f64) -> Vec<Point> {
    let side = |p: &Point| normal.x * p.x + normal.y * p.y - offset;
    let mut out = Vec::with_capacity(polygon.len() + 1);
    for (i, current) in polygon.iter().enumerate() {
        let next = &polygon[(i + 1) % polygon.len()];
        let (sc, sn) = (side(current), side(next));
        if sc <= 0.0 {
            out.push(*current);
        }
        if (sc <= 0.0) != (sn <= 0.0) {
            let t = sc / (sc - sn);
            out.push(Point::new(
                current.x + t * (next.x - current.x),
                current.y + t * (next.y - current.y),
            ));
        }
    }
    out
}

/// The finite Voronoi cell of `sites[index]`.
///
/// Sites coinciding with `sites[index]` contribute no bisector, so duplicate
/// sites produce identical cells; the later one wins at rasterization and
/// the earlier one ends up empty.
pub fn voronoi_cell(sites: &[Point], index: usize, radius: f64) -> Vec<Point> {
    let n = sites.len() as f64;
    let cx = sites.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = sites.iter().map(|p| p.y).sum::<f64>() / n;
    let mut cell = vec![
        Point::new(cx - radius, cy - radius),
        Point::new(cx + radius, cy - radius),
        Point::new(cx + radius, cy + radius),
        Point::new(cx - radius, cy + radius),
    ];

    let own = sites[index];
    for (j, other) in sites.iter().enumerate() {
        if j == index {
            continue;
        }
        let normal = Point::new(other.x - own.x, other.y - own.y);
        if normal.x == 0.0 && normal.y == 0.0 {
            continue;
        }
        // |p - own|^2 <= |p - other|^2  <=>  2 p·(other - own) <= |other|^2 - |own|^2
        let offset =
            ((other.x * other.x + other.y * other.y) - (own.x * own.x + own.y * own.y)) / 2.0;
        cell = clip_half_plane(&cell, normal, offset);
        if cell.is_empty() {
            break;
        }
    }
    cell
}

/// Row-major indices of the pixels whose centers fall inside a convex
/// polygon, limited to the `width`×`height` image.
///
/// Each scanline's coverage is the half-open interval between the leftmost
/// and rightmost edge crossings.
pub fn rasterize_convex(polygon: &[Point], width: u32, height: u32) -> Vec<u32> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    let min_y = polygon.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = polygon.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let first_row = (min_y - 0.5).ceil().max(0.0) as i64;
    let last_row = ((max_y - 0.5).ceil() as i64).min(height as i64);

    let mut pixels = Vec::new();
    for row in first_row..last_row {
        let yc = row as f64 + 0.5;
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (i, a) in polygon.iter().enumerate() {
            let b = &polygon[(i + 1) % polygon.len()];
            let (y0, y1) = if a.y <= b.y { (a.y, b.y) } else { (b.y, a.y) };
            if yc < y0 || yc > y1 || y0 == y1 {
                continue;
            }
            let t = (yc - a.y) / (b.y - a.y);
            let x = a.x + t * (b.x - a.x);
            lo = lo.min(x);
            hi = hi.max(x);
        }
        if lo >= hi {
            continue;
        }
        // Pixel centers x + 0.5 in [lo, hi)
        let first_col = (lo - 0.5).ceil().max(0.0) as i64;
        let last_col = ((hi - 0.5).ceil() as i64).min(width as i64);
        for col in first_col..last_col {
            pixels.push(row as u32 * width + col as u32);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point> {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    #[test]
    fn test_clip_half_plane_halves_square() {
        let sq = square(0.0, 0.0, 4.0, 4.0);
        // Keep x <= 2
        let clipped = clip_half_plane(&sq, Point::new(1.0, 0.0), 2.0);
        let max_x = clipped.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        assert!((max_x - 2.0).abs() < 1e-9);
        assert_eq!(clipped.len(), 4);
    }

    #[test]
    fn test_clip_half_plane_can_empty() {
        let sq = square(0.0, 0.0, 4.0, 4.0);
        let clipped = clip_half_plane(&sq, Point::new(1.0, 0.0), -1.0);
        assert!(clipped.is_empty());
    }

    #[test]
    fn test_rasterize_axis_aligned_square() {
        let sq = square(1.0, 1.0, 3.0, 4.0);
        let pixels = rasterize_convex(&sq, 5, 5);
        // Columns 1..3, rows 1..4
        assert_eq!(pixels, vec![6, 7, 11, 12, 16, 17]);
    }

    #[test]
    fn test_rasterize_clips_to_image() {
        let sq = square(-10.0, -10.0, 10.0, 10.0);
        let pixels = rasterize_convex(&sq, 3, 2);
        assert_eq!(pixels.len(), 6);
    }

    #[test]
    fn test_two_site_cells_split_image() {
        let sites = [Point::new(1.0, 2.0), Point::new(5.0, 2.0)];
        let radius = bounding_radius(&sites, 6, 4);
        let left = rasterize_convex(&voronoi_cell(&sites, 0, radius), 6, 4);
        let right = rasterize_convex(&voronoi_cell(&sites, 1, radius), 6, 4);
        // Bisector at x = 3: columns 0..3 vs 3..6
        assert_eq!(left.len(), 12);
        assert_eq!(right.len(), 12);
        assert!(left.iter().all(|&i| i % 6 < 3));
        assert!(right.iter().all(|&i| i % 6 >= 3));
    }

    #[test]
    fn test_duplicate_sites_share_a_cell() {
        let sites = [Point::new(2.0, 2.0), Point::new(2.0, 2.0)];
        let radius = bounding_radius(&sites, 4, 4);
        let a = rasterize_convex(&voronoi_cell(&sites, 0, radius), 4, 4);
        let b = rasterize_convex(&voronoi_cell(&sites, 1, radius), 4, 4);
        assert_eq!(a.len(), 16);
        assert_eq!(a, b);
    }
}
