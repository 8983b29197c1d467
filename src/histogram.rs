//! PNG histogram rendering for latency distributions.
//!
//! Occurrence counts span several orders of magnitude (the bulk of the
//! samples sit in one or two bins, outliers matter most), so bar heights
//! are log-scaled. Rendering is deliberately plain: bars and axes on a
//! white canvas, written straight through the `image` crate.

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};

use crate::error::AnalysisError;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const MARGIN_LEFT: u32 = 60;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 40;
const MARGIN_BOTTOM: u32 = 50;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const BAR: Rgb<u8> = Rgb([70, 130, 180]);

/// Render a fixed-bin histogram (the SV latency report uses 20 bins).
pub fn render_binned(values: &[i64], bins: usize, path: &Path) -> Result<(), AnalysisError> {
    let counts = bin_counts(values, bins);
    render_counts(&counts, path)
}

/// Render one bar per distinct value, in ascending value order. Used by
/// the capture analysis where latencies are already rounded to whole
/// microseconds.
pub fn render_discrete(values: &[i64], path: &Path) -> Result<(), AnalysisError> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mut counts: Vec<u64> = Vec::new();
    let mut iter = sorted.iter().peekable();
    while let Some(&v) = iter.next() {
        let mut count = 1u64;
        while iter.peek() == Some(&&v) {
            iter.next();
            count += 1;
        }
        counts.push(count);
    }

    render_counts(&counts, path)
}

/// Standard file name for an SV report histogram.
pub fn sv_histogram_filename(name: &str, stream: usize, metric: &str, vm: &str) -> String {
    format!("histogram_{name}_stream_{stream}_{metric}_{vm}.png")
}

fn bin_counts(values: &[i64], bins: usize) -> Vec<u64> {
    let mut counts = vec![0u64; bins.max(1)];
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return counts;
    };

    let span = (max - min + 1) as f64;
    let last = counts.len() - 1;
    for &v in values {
        let idx = ((v - min) as f64 / span * counts.len() as f64) as usize;
        counts[idx.min(last)] += 1;
    }
    counts
}

fn render_counts(counts: &[u64], path: &Path) -> Result<(), AnalysisError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let base_y = HEIGHT - MARGIN_BOTTOM;

    // Axes.
    for x in MARGIN_LEFT..(WIDTH - MARGIN_RIGHT) {
        img.put_pixel(x, base_y, AXIS);
    }
    for y in MARGIN_TOP..=base_y {
        img.put_pixel(MARGIN_LEFT, y, AXIS);
    }

    let max_count = counts.iter().copied().max().unwrap_or(0);
    if max_count > 0 {
        let log_max = ((max_count + 1) as f64).ln();
        let n = counts.len() as u32;
        for (i, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let h = (((count + 1) as f64).ln() / log_max * plot_h as f64) as u32;
            let x0 = MARGIN_LEFT + 1 + (i as u32 * plot_w) / n;
            let mut x1 = MARGIN_LEFT + 1 + ((i as u32 + 1) * plot_w) / n;
            if x1 <= x0 {
                x1 = x0 + 1;
            }
            for x in x0..x1.min(WIDTH - MARGIN_RIGHT) {
                for y in (base_y - h.min(plot_h))..base_y {
                    img.put_pixel(x, y, BAR);
                }
            }
        }
    }

    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| AnalysisError::Image {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn bins_cover_full_range() {
        let counts = bin_counts(&[0, 1, 2, 3, 19], 20);
        assert_eq!(counts.len(), 20);
        assert_eq!(counts.iter().sum::<u64>(), 5);
        assert_eq!(counts[19], 1);
    }

    #[test]
    fn empty_values_yield_empty_bins() {
        let counts = bin_counts(&[], 20);
        assert!(counts.iter().all(|&c| c == 0));
    }

    #[test]
    fn writes_png_and_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("latency.png");

        render_binned(&[5, 8, 8, 120, -3], 20, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn discrete_histogram_renders() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("delay.png");

        render_discrete(&[4, 4, 4, 7, 9], &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn filename_convention() {
        assert_eq!(
            sv_histogram_filename("total", 0, "latency", "guest0"),
            "histogram_total_stream_0_latency_guest0.png"
        );
    }
}
