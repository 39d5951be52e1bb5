use crate::utils::formatters::{format_currency, format_currency_with};

/// Logical canvas size; the renderer stretches it to whatever area it gets
pub const CANVAS_WIDTH: f64 = 240.0;
pub const CANVAS_HEIGHT: f64 = 64.0;

/// Average advance of one label glyph at the chart's label size
pub const GLYPH_WIDTH: f64 = 6.0;
/// Space between the end of a y label and the plot area
pub const LABEL_GAP: f64 = 6.0;

const MIN_LABEL_DIGITS: f64 = 2.0;
const MAX_LABEL_DIGITS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Padding {
    fn default() -> Self {
        Padding {
            top: 6.0,
            right: 8.0,
            bottom: 14.0,
            left: 46.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SparklineConfig {
    pub width: f64,
    pub height: f64,
    pub padding: Padding,
    /// Number of horizontal grid lines, spread from min to max
    pub y_ticks: usize,
    /// Number of vertical grid lines, spread from first to last sample
    pub x_ticks: usize,
    pub show_axis: bool,
    /// Overrides the adaptive-precision currency labels
    pub label_format: Option<fn(f64) -> String>,
    pub stroke_width: f64,
    pub fill_area: bool,
}

impl Default for SparklineConfig {
    fn default() -> Self {
        SparklineConfig {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            padding: Padding::default(),
            y_ticks: 3,
            x_ticks: 4,
            show_axis: true,
            label_format: None,
            stroke_width: 2.0,
            fill_area: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct YGridLine {
    pub value: f64,
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XGridLine {
    pub index: usize,
    pub x: f64,
}

/// Everything needed to draw one sparkline, in canvas coordinates with y
/// growing downward
#[derive(Debug, Clone, PartialEq)]
pub struct SparklineGeometry {
    pub width: f64,
    pub height: f64,
    /// Effective padding after the left side has grown to fit labels
    pub padding: Padding,
    pub inner_width: f64,
    pub inner_height: f64,
    pub stroke_width: f64,
    /// Length of the input series, gaps included
    pub sample_count: usize,
    pub line_points: Vec<(f64, f64)>,
    pub area_outline: Option<Vec<(f64, f64)>>,
    pub y_grid_lines: Vec<YGridLine>,
    pub x_grid_lines: Vec<XGridLine>,
}

impl SparklineGeometry {
    /// y coordinate of the bottom edge of the plot area
    pub fn baseline(&self) -> f64 {
        self.padding.top + self.inner_height
    }
}

/// Scales `samples` onto the configured canvas.
///
/// Non-finite samples are left out of the line but keep their slot on the x
/// axis, so a gap does not stretch the time around it. Returns `None` when
/// fewer than two finite samples remain, since a single point has no trend to
/// draw. A flat series is drawn along the top edge of the plot area.
pub fn scale_series(samples: &[f64], config: &SparklineConfig) -> Option<SparklineGeometry> {
    let data: Vec<(usize, f64)> = samples
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .collect();
    if data.len() < 2 {
        return None;
    }

    let (min, max) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| (lo.min(v), hi.max(v)));
    // Halved so that `max - min` cannot overflow for extreme finite values
    let half_domain = max / 2.0 - min / 2.0;
    let flat = half_domain <= 0.0;

    let tick_values = y_tick_values(min, max, config.y_ticks, flat);
    let labels: Vec<String> = if config.show_axis {
        match config.label_format {
            Some(format) => tick_values.iter().map(|v| format(*v)).collect(),
            // A single tick has no neighbour to stay apart from
            None if flat => tick_values.iter().map(|v| format_currency(Some(*v))).collect(),
            None => {
                let spans = config.y_ticks.saturating_sub(1).max(1) as f64;
                let digits = label_digits((half_domain / spans) * 2.0);
                tick_values
                    .iter()
                    .map(|v| format_currency_with(*v, digits, digits))
                    .collect()
            }
        }
    } else {
        Vec::new()
    };

    let mut padding = config.padding;
    if config.show_axis {
        padding.left = padding.left.max(min_left_padding(&labels));
    }

    let inner_width = (config.width - padding.left - padding.right).max(0.0);
    let inner_height = (config.height - padding.top - padding.bottom).max(0.0);
    let last = (samples.len() - 1) as f64;

    let x = |i: usize| padding.left + (i as f64 / last) * inner_width;
    let y = |v: f64| {
        if flat {
            padding.top
        } else {
            let t = (v / 2.0 - min / 2.0) / half_domain;
            padding.top + inner_height - t * inner_height
        }
    };

    let line_points: Vec<(f64, f64)> = data.iter().map(|&(i, v)| (x(i), y(v))).collect();

    let area_outline = config.fill_area.then(|| {
        let bottom = padding.top + inner_height;
        let mut outline = Vec::with_capacity(line_points.len() + 2);
        outline.push((padding.left, bottom));
        outline.extend(line_points.iter().copied());
        outline.push((padding.left + inner_width, bottom));
        outline
    });

    let y_grid_lines = tick_values
        .iter()
        .zip(labels)
        .map(|(value, label)| YGridLine {
            value: *value,
            y: y(*value),
            label,
        })
        .collect();

    let x_grid_lines = if config.show_axis {
        let spans = config.x_ticks.saturating_sub(1).max(1) as f64;
        (0..config.x_ticks)
            .map(|i| {
                let index = ((i as f64 * last) / spans).round() as usize;
                XGridLine { index, x: x(index) }
            })
            .collect()
    } else {
        Vec::new()
    };

    Some(SparklineGeometry {
        width: config.width,
        height: config.height,
        padding,
        inner_width,
        inner_height,
        stroke_width: config.stroke_width,
        sample_count: samples.len(),
        line_points,
        area_outline,
        y_grid_lines,
        x_grid_lines,
    })
}

/// Decimal digits that keep adjacent tick labels apart for a given step
pub fn label_digits(step: f64) -> usize {
    if step.is_nan() || step == f64::INFINITY {
        return MIN_LABEL_DIGITS as usize;
    }
    if step <= 0.0 {
        return MAX_LABEL_DIGITS as usize;
    }
    ((-step.log10()).ceil() + 1.0).clamp(MIN_LABEL_DIGITS, MAX_LABEL_DIGITS) as usize
}

/// Left padding needed so the widest label is not clipped
pub fn min_left_padding(labels: &[String]) -> f64 {
    let widest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    if widest == 0 {
        return 0.0;
    }
    (widest as f64 * GLYPH_WIDTH + LABEL_GAP).ceil()
}

fn y_tick_values(min: f64, max: f64, count: usize, flat: bool) -> Vec<f64> {
    if flat {
        return if count == 0 { Vec::new() } else { vec![min] };
    }
    let spans = count.saturating_sub(1).max(1) as f64;
    (0..count)
        .map(|i| {
            let t = i as f64 / spans;
            min * (1.0 - t) + max * t
        })
        .collect()
}
