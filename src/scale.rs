//! Color and position scales shared by the map and the legend.

use crate::data::StatisticRecord;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgb(r, g, b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl From<Rgb> for ratatui::style::Color {
    fn from(c: Rgb) -> Self {
        ratatui::style::Color::Rgb(c.0, c.1, c.2)
    }
}

/// Sequential greens, light to dark, for 3 through 9 classes
const GREENS: [&str; 7] = [
    "e5f5e0a1d99b31a354",
    "edf8e9bae4b374c476238b45",
    "edf8e9bae4b374c47631a354006d2c",
    "edf8e9c7e9c0a1d99b74c47631a354006d2c",
    "edf8e9c7e9c0a1d99b74c47641ab5d238b45005a32",
    "f7fcf5e5f5e0c7e9c0a1d99b74c47641ab5d238b45005a32",
    "f7fcf5e5f5e0c7e9c0a1d99b74c47641ab5d238b45006d2c00441b",
];

/// The green scheme with `classes` colors, `None` outside 3..=9
pub fn greens(classes: usize) -> Option<Vec<Rgb>> {
    let scheme = GREENS.get(classes.checked_sub(3)?)?;
    (0..classes)
        .map(|i| Rgb::from_hex(&scheme[i * 6..i * 6 + 6]))
        .collect()
}

/// Smallest and largest percentage, `[0, 1]` when there are no usable values
pub fn extent(records: &[StatisticRecord]) -> (f64, f64) {
    let mut values = records.iter().map(|r| r.percentage).filter(|v| !v.is_nan());
    let Some(first) = values.next() else {
        return (0.0, 1.0);
    };
    values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Maps a continuous domain onto a fixed list of colors in equal-width bins
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeScale {
    domain: (f64, f64),
    range: Vec<Rgb>,
    thresholds: Vec<f64>,
}

impl QuantizeScale {
    pub fn new(domain: (f64, f64), range: Vec<Rgb>) -> Self {
        let (x0, x1) = domain;
        let n = range.len() as f64;
        let thresholds = (1..range.len())
            .map(|i| {
                let i = i as f64;
                (i * x1 - (i - n) * x0) / n
            })
            .collect();
        Self {
            domain,
            range,
            thresholds,
        }
    }

    /// Scale over the percentages of `records` with the given palette
    pub fn from_records(records: &[StatisticRecord], palette: Vec<Rgb>) -> Self {
        Self::new(extent(records), palette)
    }

    /// Index of the bin holding `value`; values outside the domain clamp to
    /// the first or last bin
    pub fn bin(&self, value: f64) -> Option<usize> {
        if value.is_nan() || self.range.is_empty() {
            return None;
        }
        Some(self.thresholds.partition_point(|t| *t <= value))
    }

    pub fn apply(&self, value: f64) -> Option<Rgb> {
        self.bin(value).map(|i| self.range[i])
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> &[Rgb] {
        &self.range
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Domain interval covered by bin `i`
    pub fn invert_extent(&self, i: usize) -> Option<(f64, f64)> {
        if i >= self.range.len() {
            return None;
        }
        let lo = if i == 0 { self.domain.0 } else { self.thresholds[i - 1] };
        let hi = self.thresholds.get(i).copied().unwrap_or(self.domain.1);
        Some((lo, hi))
    }
}

/// Linear interpolation between a numeric domain and range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            // degenerate domain maps to the middle of the range
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }
}

/// `count` evenly spaced values starting at `min`, followed by `max`.
///
/// An empty domain has no spacing, so only `max` is returned.
pub fn ticks_with_max(min: f64, max: f64, count: usize) -> Vec<f64> {
    let mut ticks = Vec::with_capacity(count + 1);
    if count > 0 && max > min {
        let step = (max - min) / count as f64;
        ticks.extend((0..count).map(|i| min + step * i as f64));
    }
    ticks.push(max);
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greens8() -> Vec<Rgb> {
        greens(8).unwrap()
    }

    #[test]
    fn test_palette_sizes() {
        for classes in 3..=9 {
            assert_eq!(greens(classes).unwrap().len(), classes);
        }
        assert!(greens(2).is_none());
        assert!(greens(10).is_none());
        let palette = greens8();
        assert_eq!(palette[0], Rgb(0xf7, 0xfc, 0xf5));
        assert_eq!(palette[7], Rgb(0x00, 0x5a, 0x32));
        assert_eq!(palette[7].to_string(), "#005a32");
    }

    #[test]
    fn test_thresholds_split_domain_evenly() {
        let scale = QuantizeScale::new((2.0, 82.0), greens8());
        assert_eq!(
            scale.thresholds(),
            &[12.0, 22.0, 32.0, 42.0, 52.0, 62.0, 72.0]
        );
        for i in 0..8 {
            let (lo, hi) = scale.invert_extent(i).unwrap();
            assert!((hi - lo - 10.0).abs() < 1e-9);
        }
        assert!(scale.invert_extent(8).is_none());
    }

    #[test]
    fn test_endpoints_and_clamping() {
        let palette = greens8();
        let scale = QuantizeScale::new((10.0, 90.0), palette.clone());
        assert_eq!(scale.apply(10.0), Some(palette[0]));
        assert_eq!(scale.apply(90.0), Some(palette[7]));
        assert_eq!(scale.apply(-5.0), Some(palette[0]));
        assert_eq!(scale.apply(500.0), Some(palette[7]));
        assert_eq!(scale.apply(f64::NAN), None);
    }

    #[test]
    fn test_monotonic_over_domain() {
        let scale = QuantizeScale::new((2.6, 75.1), greens8());
        let mut last = 0;
        let mut v = 0.0;
        while v <= 80.0 {
            let bin = scale.bin(v).unwrap();
            assert!(bin >= last);
            assert!(bin < 8);
            last = bin;
            v += 0.1;
        }
        assert_eq!(last, 7);
    }

    #[test]
    fn test_degenerate_domain() {
        let palette = greens8();
        let scale = QuantizeScale::new((40.0, 40.0), palette.clone());
        assert_eq!(scale.apply(39.0), Some(palette[0]));
        assert_eq!(scale.apply(40.0), Some(palette[7]));
        assert_eq!(scale.range().len(), 8);
    }

    #[test]
    fn test_extent_of_records() {
        let record = |p| StatisticRecord {
            id: 1,
            area_name: String::new(),
            state_name: String::new(),
            percentage: p,
        };
        assert_eq!(extent(&[record(30.0), record(5.5), record(70.0)]), (5.5, 70.0));
        assert_eq!(extent(&[]), (0.0, 1.0));
    }

    #[test]
    fn test_ticks_end_exactly_at_max() {
        let ticks = ticks_with_max(10.0, 90.0, 8);
        assert_eq!(ticks.len(), 9);
        assert_eq!(ticks[0], 10.0);
        assert_eq!(ticks[1], 20.0);
        assert_eq!(*ticks.last().unwrap(), 90.0);

        assert_eq!(ticks_with_max(40.0, 40.0, 8), vec![40.0]);
    }

    #[test]
    fn test_linear_scale() {
        let axis = LinearScale::new((10.0, 90.0), (200.0, 0.0));
        assert_eq!(axis.apply(10.0), 200.0);
        assert_eq!(axis.apply(90.0), 0.0);
        assert_eq!(axis.apply(50.0), 100.0);
    }
}
