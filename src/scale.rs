use crate::dataset::Dataset;
use crate::error::Result;
use crate::summary::SummaryStats;

/// Intervals the value axis aims for when picking a tick increment.
const TICK_COUNT: usize = 10;

/// Pixel geometry of the target surface. `width` and `height` are the
/// plot's right and bottom edges; the full canvas adds the right and bottom
/// margins back on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_left: f64,
    pub margin_bottom: f64,
    pub margin_right: f64,
}

impl Viewport {
    /// Build from a full canvas size; the plot edges exclude all margins.
    pub fn from_canvas(
        canvas_width: f64,
        canvas_height: f64,
        margin_top: f64,
        margin_left: f64,
        margin_bottom: f64,
        margin_right: f64,
    ) -> Self {
        Viewport {
            width: canvas_width - margin_left - margin_right,
            height: canvas_height - margin_top - margin_bottom,
            margin_top,
            margin_left,
            margin_bottom,
            margin_right,
        }
    }

    pub fn canvas_width(&self) -> f64 {
        self.width + self.margin_left + self.margin_right
    }

    pub fn canvas_height(&self) -> f64 {
        self.height + self.margin_top + self.margin_bottom
    }
}

impl Default for Viewport {
    /// 960x500 canvas with margins 50/70/20/10.
    fn default() -> Self {
        Viewport::from_canvas(960.0, 500.0, 50.0, 70.0, 20.0, 10.0)
    }
}

/// Discrete horizontal scale: each distinct category value owns one
/// equal-width contiguous band, in first-occurrence order.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    categories: Vec<String>,
    start: f64,
    end: f64,
}

impl BandScale {
    pub fn new(categories: Vec<String>, start: f64, end: f64) -> Self {
        BandScale {
            categories,
            start,
            end,
        }
    }

    /// Start position of the category's band, or None for a value outside
    /// the domain.
    pub fn position(&self, category: &str) -> Option<f64> {
        self.categories
            .iter()
            .position(|c| c == category)
            .map(|i| self.start + i as f64 * self.band_width())
    }

    pub fn band_width(&self) -> f64 {
        if self.categories.is_empty() {
            return 0.0;
        }
        (self.end - self.start) / self.categories.len() as f64
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

/// Continuous vertical scale: linear map from `[0, domain_max]` to
/// `[range_start, range_end]`. The range runs top-down on screen, so the
/// pixel for 0 is the larger coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_max: f64,
    range_start: f64,
    range_end: f64,
}

impl LinearScale {
    pub fn new(domain_max: f64, range_start: f64, range_end: f64) -> Self {
        LinearScale {
            domain_max,
            range_start,
            range_end,
        }
    }

    pub fn to_pixel(&self, value: f64) -> f64 {
        self.range_start + (value / self.domain_max) * (self.range_end - self.range_start)
    }

    pub fn from_pixel(&self, px: f64) -> f64 {
        (px - self.range_start) / (self.range_end - self.range_start) * self.domain_max
    }

    pub fn domain_max(&self) -> f64 {
        self.domain_max
    }

    /// Tick values from 0 up to the domain maximum, spaced by the nice
    /// increment. The domain maximum was niced with the same increment, so
    /// the top tick lands on it.
    pub fn ticks(&self) -> Vec<f64> {
        let step = tick_increment(self.domain_max, TICK_COUNT);
        let count = (self.domain_max / step).round() as usize;
        (0..=count).map(|i| i as f64 * step).collect()
    }
}

/// Both mappings for one chart: categorical keys to horizontal band starts,
/// numeric values to vertical pixel offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleMapping {
    pub band: BandScale,
    pub value: LinearScale,
}

/// Fix both scales for a render. Deterministic: identical inputs produce
/// mappings that agree pointwise.
pub fn build_scales(
    dataset: &Dataset,
    category_field: &str,
    summary: &SummaryStats,
    viewport: &Viewport,
) -> Result<ScaleMapping> {
    let col = dataset.require_column(category_field)?;

    let mut categories: Vec<String> = Vec::new();
    for record in dataset.records() {
        let cat = record.get(col).unwrap_or("");
        if !categories.iter().any(|c| c == cat) {
            categories.push(cat.to_string());
        }
    }

    let band = BandScale::new(categories, viewport.margin_left, viewport.width);
    let value = LinearScale::new(
        nice_ceil(summary.max_gridded, TICK_COUNT),
        viewport.height,
        viewport.margin_top,
    );

    Ok(ScaleMapping { band, value })
}

/// Extend `max` outward to the next multiple of a tick-friendly increment,
/// so the axis ends on a round tick.
pub fn nice_ceil(max: f64, count: usize) -> f64 {
    if !(max > 0.0) {
        // Degenerate domain: fall back to a unit axis.
        return 1.0;
    }
    let step = tick_increment(max, count);
    (max / step).ceil() * step
}

/// Tick increment of 1, 2 or 5 times a power of ten, targeting `count`
/// intervals over `[0, max]`.
fn tick_increment(max: f64, count: usize) -> f64 {
    let raw = max / count as f64;
    let power = raw.log10().floor();
    let base = 10f64.powf(power);
    let error = raw / base;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use crate::error::GeometryError;

    const EPS: f64 = 1e-9;

    fn dataset(rows: &[(&str, &str)]) -> Dataset {
        let records = rows
            .iter()
            .map(|(c, v)| Record::new(vec![c.to_string(), v.to_string()]))
            .collect();
        Dataset::new(vec!["year".to_string(), "avg_views".to_string()], records)
    }

    fn summary(max_gridded: f64) -> SummaryStats {
        SummaryStats {
            mean: max_gridded / 2.0,
            max_gridded,
        }
    }

    #[test]
    fn test_bands_partition_horizontal_span() {
        let data = dataset(&[("2018", "1.02"), ("2019", "1.18"), ("2020", "0.95")]);
        let viewport = Viewport::default();
        let scales = build_scales(&data, "year", &summary(1.2), &viewport).unwrap();

        let width = scales.band.band_width();
        assert!((width - (viewport.width - viewport.margin_left) / 3.0).abs() < EPS);
        assert_eq!(scales.band.position("2018").unwrap(), viewport.margin_left);
        assert!(
            (scales.band.position("2019").unwrap() - (viewport.margin_left + width)).abs() < EPS
        );
        let last = scales.band.position("2020").unwrap();
        assert!((last + width - viewport.width).abs() < EPS);
    }

    #[test]
    fn test_band_positions_are_injective_and_ordered() {
        let data = dataset(&[
            ("2018", "1.0"),
            ("2019", "1.0"),
            ("2020", "1.0"),
            ("2021", "1.0"),
        ]);
        let scales = build_scales(&data, "year", &summary(1.0), &Viewport::default()).unwrap();

        let positions: Vec<f64> = scales
            .band
            .categories()
            .iter()
            .map(|c| scales.band.position(c).unwrap())
            .collect();
        let mut deduped = positions.clone();
        deduped.dedup_by(|a, b| (*a - *b).abs() < EPS);
        assert_eq!(deduped.len(), 4, "band starts must be distinct");
        let mut sorted = positions.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(positions, sorted, "band starts follow domain order");
    }

    #[test]
    fn test_categories_keep_first_occurrence_order() {
        let data = dataset(&[("2020", "1.0"), ("2018", "1.0"), ("2020", "1.5")]);
        let scales = build_scales(&data, "year", &summary(1.5), &Viewport::default()).unwrap();
        assert_eq!(scales.band.categories(), &["2020", "2018"]);
    }

    #[test]
    fn test_unknown_category_has_no_band() {
        let data = dataset(&[("2018", "1.0")]);
        let scales = build_scales(&data, "year", &summary(1.0), &Viewport::default()).unwrap();
        assert_eq!(scales.band.position("1999"), None);
    }

    #[test]
    fn test_missing_category_column() {
        let data = dataset(&[("2018", "1.0")]);
        let err = build_scales(&data, "season", &summary(1.0), &Viewport::default()).unwrap_err();
        match err {
            GeometryError::UnknownField { field, .. } => assert_eq!(field, "season"),
            other => panic!("Expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn test_value_scale_is_inverted_and_monotone() {
        let viewport = Viewport::default();
        let data = dataset(&[("2018", "1.2")]);
        let scales = build_scales(&data, "year", &summary(1.2), &viewport).unwrap();

        assert!((scales.value.to_pixel(0.0) - viewport.height).abs() < EPS);
        assert!(
            (scales.value.to_pixel(scales.value.domain_max()) - viewport.margin_top).abs() < EPS
        );

        let mut prev = f64::INFINITY;
        let max = scales.value.domain_max();
        for i in 0..=100 {
            let px = scales.value.to_pixel(max * i as f64 / 100.0);
            assert!(px <= prev + EPS, "larger value mapped further down");
            prev = px;
        }
    }

    #[test]
    fn test_value_scale_round_trips() {
        let scale = LinearScale::new(1.2, 430.0, 50.0);
        for v in [0.0, 0.3, 0.95, 1.2] {
            assert!((scale.from_pixel(scale.to_pixel(v)) - v).abs() < EPS);
        }
    }

    #[test]
    fn test_build_scales_is_deterministic() {
        let data = dataset(&[("2018", "1.02"), ("2019", "1.18"), ("2020", "0.95")]);
        let viewport = Viewport::default();
        let a = build_scales(&data, "year", &summary(1.2), &viewport).unwrap();
        let b = build_scales(&data, "year", &summary(1.2), &viewport).unwrap();

        for cat in a.band.categories() {
            assert_eq!(a.band.position(cat), b.band.position(cat));
        }
        for i in 0..=50 {
            let v = a.value.domain_max() * i as f64 / 50.0;
            assert_eq!(a.value.to_pixel(v), b.value.to_pixel(v));
        }
    }

    #[test]
    fn test_nice_ceil() {
        assert!((nice_ceil(1.2, 10) - 1.2).abs() < EPS); // already on a tick
        assert!((nice_ceil(0.97, 10) - 1.0).abs() < EPS);
        assert!((nice_ceil(9.7, 10) - 10.0).abs() < EPS);
        assert!((nice_ceil(23.0, 10) - 24.0).abs() < EPS); // 2 * 10^0 increments
        assert_eq!(nice_ceil(0.0, 10), 1.0); // degenerate domain
    }

    #[test]
    fn test_ticks_cover_domain_with_round_values() {
        let scale = LinearScale::new(1.2, 430.0, 50.0);
        let ticks = scale.ticks();
        assert_eq!(ticks.len(), 13); // 0.0, 0.1, ..., 1.2
        assert!((ticks[0] - 0.0).abs() < EPS);
        assert!((ticks[12] - 1.2).abs() < EPS);
        assert!((ticks[1] - 0.1).abs() < EPS);
    }

    #[test]
    fn test_viewport_from_canvas() {
        let viewport = Viewport::from_canvas(960.0, 500.0, 50.0, 70.0, 20.0, 10.0);
        assert_eq!(viewport.width, 880.0);
        assert_eq!(viewport.height, 430.0);
        assert_eq!(viewport.canvas_width(), 960.0);
        assert_eq!(viewport.canvas_height(), 500.0);
    }
}
