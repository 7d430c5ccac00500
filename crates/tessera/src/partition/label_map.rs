//! Per-pixel piece labels and the repair passes run on them.
//!
//! Every pass here is pure: it reads one [`LabelMap`] and returns a new one,
//! so no pass ever observes its own partial writes.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rand::Rng;

use crate::error::PuzzleError;
use crate::raster::Mask;

/// Marker for a pixel no cell claimed.
pub const UNLABELED: u32 = u32::MAX;

/// Maximum 2-means rounds per bisection.
const KMEANS_ITERATIONS: usize = 20;

/// A width×height raster of piece labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    labels: Vec<u32>,
}

impl LabelMap {
    /// A map with every pixel unlabeled.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            labels: vec![UNLABELED; width as usize * height as usize],
        }
    }

    /// Wrap row-major labels.
    pub fn from_labels(width: u32, height: u32, labels: Vec<u32>) -> Result<Self, PuzzleError> {
        if labels.len() != width as usize * height as usize {
            return Err(PuzzleError::InputInvalid(format!(
                "{}x{} label map needs {} labels, got {}",
                width,
                height,
                width as usize * height as usize,
                labels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            labels,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.labels[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub(crate) fn set_index(&mut self, index: usize, label: u32) {
        self.labels[index] = label;
    }

    /// True when no pixel is [`UNLABELED`].
    pub fn is_complete(&self) -> bool {
        self.labels.iter().all(|&l| l != UNLABELED)
    }

    /// Distinct labels present, ascending.
    pub fn distinct(&self) -> BTreeSet<u32> {
        self.labels
            .iter()
            .copied()
            .filter(|&l| l != UNLABELED)
            .collect()
    }

    /// Pixel counts per label.
    pub fn region_sizes(&self) -> BTreeMap<u32, usize> {
        let mut sizes = BTreeMap::new();
        for &l in self.labels.iter().filter(|&&l| l != UNLABELED) {
            *sizes.entry(l).or_insert(0) += 1;
        }
        sizes
    }

    /// Boolean mask of one label.
    pub fn mask(&self, label: u32) -> Mask {
        let width = self.width as usize;
        Mask::from_fn(self.width, self.height, |x, y| {
            self.labels[y as usize * width + x as usize] == label
        })
    }

    /// Give every unlabeled pixel the label of its nearest labeled pixel.
    ///
    /// Vector propagation over 8-neighbors: each pixel remembers which
    /// labeled source reached it and is only overwritten by a strictly
    /// closer one. A map without any labeled pixel is returned unchanged.
    pub fn fill_nearest(&self) -> LabelMap {
        let (w, h) = (self.width as i64, self.height as i64);
        let mut out = self.clone();
        let mut best = vec![u64::MAX; self.labels.len()];
        let mut source = vec![0usize; self.labels.len()];
        let mut queue = VecDeque::new();

        for (i, &l) in self.labels.iter().enumerate() {
            if l != UNLABELED {
                best[i] = 0;
                source[i] = i;
                queue.push_back(i);
            }
        }

        while let Some(i) = queue.pop_front() {
            let src = source[i];
            let (sx, sy) = ((src as i64) % w, (src as i64) / w);
            let (x, y) = ((i as i64) % w, (i as i64) / w);
            for dy in -1..=1i64 {
                for dx in -1..=1i64 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let j = (ny * w + nx) as usize;
                    let d = ((nx - sx).pow(2) + (ny - sy).pow(2)) as u64;
                    if d < best[j] {
                        best[j] = d;
                        source[j] = src;
                        out.labels[j] = self.labels[src];
                        queue.push_back(j);
                    }
                }
            }
        }
        out
    }

    /// Ascending `old → new` mapping onto `0..count`.
    pub fn relabel_mapping(&self) -> BTreeMap<u32, u32> {
        self.distinct()
            .into_iter()
            .enumerate()
            .map(|(new, old)| (old, new as u32))
            .collect()
    }

    /// Apply `mapping` in one pass. Labels missing from it become
    /// [`UNLABELED`].
    pub fn remap(&self, mapping: &BTreeMap<u32, u32>) -> LabelMap {
        LabelMap {
            width: self.width,
            height: self.height,
            labels: self
                .labels
                .iter()
                .map(|l| mapping.get(l).copied().unwrap_or(UNLABELED))
                .collect(),
        }
    }

    /// Relabel onto the contiguous range `0..count`; returns the new map and
    /// `count`.
    pub fn compact(&self) -> (LabelMap, usize) {
        let mapping = self.relabel_mapping();
        (self.remap(&mapping), mapping.len())
    }

    /// Split the largest region in two by 2-means over its pixel
    /// coordinates. The second cluster receives `new_label`.
    ///
    /// Ties between equally large regions go to the lowest label. Fails when
    /// the largest region has fewer than two pixels.
    pub fn bisect_largest<R: Rng + ?Sized>(
        &self,
        new_label: u32,
        rng: &mut R,
    ) -> Result<LabelMap, PuzzleError> {
        let sizes = self.region_sizes();
        let mut target = None;
        for (&label, &size) in &sizes {
            match target {
                Some((_, best)) if size <= best => {}
                _ => target = Some((label, size)),
            }
        }
        let (label, size) = target
            .ok_or_else(|| PuzzleError::DegenerateTessellation("no region to bisect".into()))?;
        if size < 2 {
            return Err(PuzzleError::DegenerateTessellation(format!(
                "largest region {} has a single pixel",
                label
            )));
        }

        let w = self.width as usize;
        let members: Vec<usize> = (0..self.labels.len())
            .filter(|&i| self.labels[i] == label)
            .collect();
        let coords: Vec<(f64, f64)> = members
            .iter()
            .map(|&i| ((i % w) as f64, (i / w) as f64))
            .collect();

        let second = two_means(&coords, rng);
        let mut out = self.clone();
        for (k, &i) in members.iter().enumerate() {
            if second[k] {
                out.labels[i] = new_label;
            }
        }
        tracing::debug!(
            label,
            size,
            new_label,
            moved = second.iter().filter(|&&b| b).count(),
            "bisected region"
        );
        Ok(out)
    }
}

/// Two-cluster assignment of `points` (true = second cluster). Both clusters
/// are non-empty for two or more distinct points.
fn two_means<R: Rng + ?Sized>(points: &[(f64, f64)], rng: &mut R) -> Vec<bool> {
    let dist2 = |a: (f64, f64), b: (f64, f64)| (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2);

    let first = points[rng.gen_range(0..points.len())];
    let mut far = first;
    let mut far_d = -1.0;
    for &p in points {
        let d = dist2(p, first);
        if d > far_d {
            far_d = d;
            far = p;
        }
    }

    let mut centers = [first, far];
    let mut assign = vec![false; points.len()];
    for round in 0..KMEANS_ITERATIONS {
        let next: Vec<bool> = points
            .iter()
            .map(|&p| dist2(p, centers[1]) < dist2(p, centers[0]))
            .collect();
        let ones = next.iter().filter(|&&b| b).count();
        if ones == 0 || ones == points.len() {
            return median_split(points);
        }
        let changed = round == 0 || next != assign;
        assign = next;
        if !changed {
            break;
        }
        let mut sums = [(0.0, 0.0, 0usize); 2];
        for (&p, &second) in points.iter().zip(&assign) {
            let s = &mut sums[second as usize];
            s.0 += p.0;
            s.1 += p.1;
            s.2 += 1;
        }
        for (center, (sx, sy, n)) in centers.iter_mut().zip(sums) {
            *center = (sx / n as f64, sy / n as f64);
        }
    }
    assign
}

/// Split at the median along the region's longer axis.
fn median_split(points: &[(f64, f64)]) -> Vec<bool> {
    let (min_x, max_x) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.0), hi.max(p.0)));
    let (min_y, max_y) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
    let along_x = max_x - min_x >= max_y - min_y;
    let key = |p: &(f64, f64)| if along_x { (p.0, p.1) } else { (p.1, p.0) };

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        let (ka, kb) = (key(&points[a]), key(&points[b]));
        ka.0.total_cmp(&kb.0).then(ka.1.total_cmp(&kb.1))
    });
    let mut assign = vec![false; points.len()];
    for &i in &order[points.len() / 2..] {
        assign[i] = true;
    }
    assign
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const U: u32 = UNLABELED;

    #[test]
    fn test_fill_nearest_takes_closest_label() {
        let map = LabelMap::from_labels(5, 1, vec![0, U, U, U, 1]).unwrap();
        let filled = map.fill_nearest();
        // The equidistant middle pixel keeps the first label that reached it
        assert_eq!(filled.labels(), &[0, 0, 0, 1, 1]);
        assert!(filled.is_complete());
    }

    #[test]
    fn test_fill_nearest_2d() {
        #[rustfmt::skip]
        let map = LabelMap::from_labels(4, 4, vec![
            7, U, U, U,
            U, U, U, U,
            U, U, U, U,
            U, U, U, 3,
        ]).unwrap();
        let filled = map.fill_nearest();
        assert!(filled.is_complete());
        assert_eq!(filled.get(1, 0), 7);
        assert_eq!(filled.get(0, 1), 7);
        assert_eq!(filled.get(3, 2), 3);
        assert_eq!(filled.get(2, 3), 3);
        // Labeled pixels never change
        assert_eq!(filled.get(0, 0), 7);
        assert_eq!(filled.get(3, 3), 3);
    }

    #[test]
    fn test_fill_nearest_without_seeds_is_noop() {
        let map = LabelMap::new(3, 3);
        assert_eq!(map.fill_nearest(), map);
    }

    #[test]
    fn test_relabel_mapping_is_ascending_and_pure() {
        let map = LabelMap::from_labels(4, 1, vec![5, 2, 9, 2]).unwrap();
        let mapping = map.relabel_mapping();
        assert_eq!(
            mapping.into_iter().collect::<Vec<_>>(),
            vec![(2, 0), (5, 1), (9, 2)]
        );
        let (compacted, count) = map.compact();
        assert_eq!(count, 3);
        assert_eq!(compacted.labels(), &[1, 0, 2, 0]);
        // Source untouched
        assert_eq!(map.labels(), &[5, 2, 9, 2]);
    }

    #[test]
    fn test_remap_chain_does_not_alias() {
        // 0 -> 1 and 1 -> 0 must swap, not collapse
        let map = LabelMap::from_labels(2, 1, vec![0, 1]).unwrap();
        let mapping = BTreeMap::from([(0, 1), (1, 0)]);
        assert_eq!(map.remap(&mapping).labels(), &[1, 0]);
    }

    #[test]
    fn test_bisect_largest_splits_into_two_nonempty_halves() {
        let map = LabelMap::from_labels(6, 2, vec![0; 12]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let split = map.bisect_largest(1, &mut rng).unwrap();
        let sizes = split.region_sizes();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[&0] + sizes[&1], 12);
        assert!(sizes[&0] > 0 && sizes[&1] > 0);
    }

    #[test]
    fn test_bisect_prefers_lowest_label_on_tie() {
        let map = LabelMap::from_labels(4, 1, vec![1, 1, 0, 0]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let split = map.bisect_largest(2, &mut rng).unwrap();
        assert_eq!(&split.labels()[..2], &[1, 1]);
        let mut tail = split.labels()[2..].to_vec();
        tail.sort();
        assert_eq!(tail, vec![0, 2]);
    }

    #[test]
    fn test_bisect_single_pixel_region_fails() {
        let map = LabelMap::from_labels(2, 1, vec![0, 1]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            map.bisect_largest(2, &mut rng),
            Err(PuzzleError::DegenerateTessellation(_))
        ));
    }

    #[test]
    fn test_median_split_halves() {
        let points: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, 0.0)).collect();
        let assign = median_split(&points);
        assert_eq!(assign, vec![false, false, true, true, true]);
    }
}
