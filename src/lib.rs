//! Geometry pipeline for a calendar heatmap of daily temperature series.
//!
//! One cell per (year, month): the fill encodes the monthly maximum
//! temperature on a fixed 0–40 Celsius turbo palette and two sparklines
//! (daily max, daily min) trace the intra-month variation. The crate stops
//! at geometry: it turns a delimited daily-temperature table into colors,
//! grid offsets and coordinate paths for a renderer to draw.

use std::collections::BTreeMap;
use std::str::FromStr;

use logos::Logos;
use miette::Diagnostic;
use thiserror::Error;
use time::{Date, Month};

/// English month names, indexed by month number 0–11.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// An sRGB 8-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

/// The turbo palette sampled at `t` in `[0, 1]`: dark-blue (cold) → cyan →
/// green → yellow → red → dark-red (hot). Out-of-range `t` is clamped and
/// `NaN` resolves to the cold end.
pub fn turbo(t: f32) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) as f64 };
    let r = 34.61 + t * (1172.33 - t * (10793.56 - t * (33300.12 - t * (38394.49 - t * 14825.05))));
    let g = 23.31 + t * (557.33 + t * (1225.33 - t * (3574.96 - t * (1073.77 + t * 707.56))));
    let b = 27.2 + t * (3211.1 - t * (15327.97 - t * (27814.0 - t * (22569.18 - t * 6838.66))));
    Rgb([channel(r), channel(g), channel(b)])
}

fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Maps a temperature to a color over a fixed domain, clamped at both ends.
///
/// The domain deliberately never adapts to the data: the same temperature
/// must colorize identically across cells, datasets and the legend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    domain: (f32, f32),
}

impl Default for ColorScale {
    fn default() -> Self {
        Self { domain: (0.0, 40.0) }
    }
}

impl ColorScale {
    pub fn new(domain: (f32, f32)) -> Self {
        Self { domain }
    }

    pub fn domain(&self) -> (f32, f32) {
        self.domain
    }

    pub fn color_for(&self, temperature: f32) -> Rgb {
        let (lo, hi) = self.domain;
        turbo((temperature - lo) / (hi - lo))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgConfig {
    pub width: f32,
    pub height: f32,
    pub margin: Margin,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellConfig {
    // The cell width is derived from the year count, see `create_layout`
    pub height: f32,
    pub spark_pad_x: f32,
    pub spark_pad_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendConfig {
    pub bar_width: f32,
    pub bar_height: f32,
    pub tick_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceColors {
    pub max_line: Rgb,
    pub min_line: Rgb,
    pub border: Rgb,
}

/// Everything the pipeline is parameterized on. Passed explicitly into the
/// entry points so runs stay pure and reproducible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartConfig {
    pub svg: SvgConfig,
    pub cell: CellConfig,
    pub legend: LegendConfig,
    pub colors: TraceColors,
    /// Fixed Celsius range shown in the legend.
    pub temp_domain: (f32, f32),
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            svg: SvgConfig {
                width: 1150.0,
                height: 720.0,
                margin: Margin { top: 55.0, right: 130.0, bottom: 30.0, left: 110.0 },
            },
            cell: CellConfig { height: 52.0, spark_pad_x: 4.0, spark_pad_y: 5.0 },
            legend: LegendConfig { bar_width: 18.0, bar_height: 260.0, tick_count: 5 },
            colors: TraceColors {
                max_line: Rgb([0x22, 0xa8, 0x4a]),
                min_line: Rgb([0xd8, 0xd8, 0xd8]),
                border: Rgb([0x7b, 0x8e, 0xa6]),
            },
            temp_domain: (0.0, 40.0),
        }
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\r]+")] // Ignore this regex pattern between tokens
enum Token {
    #[regex(r"[0-9]{4}-[0-9]{2}-[0-9]{2}", priority = 3)]
    Date,

    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,
    #[regex("[a-zA-Z_]+")]
    Word,

    #[token(",")]
    Comma,
    #[token("---")]
    MissingData,
}

/// One row of the daily-temperature table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRecord {
    pub date: Date,
    pub max: f32,
    pub min: f32,
}

/// A parsed daily-temperature table, plus data-quality counters.
///
/// Rows whose date cannot be read are dropped and counted in
/// `skipped_rows`; unreadable numeric fields coerce to `NaN` and are
/// counted in `nan_fields`. Neither is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub records: Vec<DailyRecord>,
    pub skipped_rows: usize,
    pub nan_fields: usize,
}

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("the table is empty, expected a `date,max_temperature,min_temperature` header")]
    #[diagnostic(code(thermocal::missing_header))]
    MissingHeader,
    #[error("bad header: expected `date,max_temperature,min_temperature`, got `{0}`")]
    #[diagnostic(code(thermocal::bad_header))]
    BadHeader(String),
}

const HEADER_FIELDS: [&str; 3] = ["date", "max_temperature", "min_temperature"];

impl FromStr for DailySeries {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines();
        let header = lines.next().ok_or(ParseError::MissingHeader)?;
        check_header(header)?;

        let mut records = Vec::new();
        let mut skipped_rows = 0;
        let mut nan_fields = 0;

        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            match parse_row(line) {
                Some((record, nans)) => {
                    nan_fields += nans;
                    records.push(record);
                }
                None => skipped_rows += 1,
            }
        }

        Ok(Self { records, skipped_rows, nan_fields })
    }
}

fn check_header(line: &str) -> Result<(), ParseError> {
    let mut lex = Token::lexer(line);
    for (i, field) in HEADER_FIELDS.iter().enumerate() {
        if i > 0 {
            match lex.next() {
                Some(Ok(Token::Comma)) => (),
                _ => return Err(ParseError::BadHeader(line.to_string())),
            }
        }
        match lex.next() {
            Some(Ok(Token::Word)) if lex.slice() == *field => (),
            _ => return Err(ParseError::BadHeader(line.to_string())),
        }
    }
    // Extra columns are tolerated, the first three are positional.
    Ok(())
}

// Returns the record plus how many of its numeric fields degraded to NaN,
// or None when the date field is unreadable and the row must be dropped.
fn parse_row(line: &str) -> Option<(DailyRecord, usize)> {
    let mut fields = line.split(',');
    let date = fields.next().and_then(lex_date)?;

    let mut nan_fields = 0;
    let mut number = |field: Option<&str>| {
        let value = field.map_or(f32::NAN, lex_number);
        if value.is_nan() {
            nan_fields += 1;
        }
        value
    };
    let max = number(fields.next());
    let min = number(fields.next());

    Some((DailyRecord { date, max, min }, nan_fields))
}

fn lex_date(field: &str) -> Option<Date> {
    let mut lex = Token::lexer(field);
    let date = match lex.next() {
        Some(Ok(Token::Date)) => {
            // The regex pins the shape, the components can still be out of
            // range ("2020-13-40")
            let slice = lex.slice();
            let year = slice[..4].parse().ok()?;
            let month: u8 = slice[5..7].parse().ok()?;
            let day: u8 = slice[8..10].parse().ok()?;
            Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()?
        }
        _ => return None,
    };
    lex.next().is_none().then_some(date)
}

fn lex_number(field: &str) -> f32 {
    let mut lex = Token::lexer(field);
    let value = match lex.next() {
        Some(Ok(Token::Number)) => lex.slice().parse().unwrap_or(f32::NAN),
        _ => f32::NAN,
    };
    if lex.next().is_some() {
        f32::NAN
    } else {
        value
    }
}

/// All daily records of one calendar month, with precomputed extrema.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRecord {
    pub year: i32,
    /// Month number 0–11.
    pub month: u8,
    /// First of the month.
    pub month_date: Date,
    // Sorted ascending by date, never empty
    pub values: Vec<DailyRecord>,
    pub max_value: f32,
    pub min_value: f32,
}

impl MonthlyRecord {
    /// `YYYY-MM` label shown on hover.
    pub fn month_label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month + 1)
    }
}

/// Groups daily records into one [`MonthlyRecord`] per distinct
/// (year, month), sorted ascending by month.
///
/// Grouping keys come from the calendar date components, never from a
/// string form of the date. Extrema use the IEEE total order, so a `NaN`
/// produced by a malformed numeric field sorts above every finite value
/// and degrades that month's extrema instead of crashing.
pub fn to_monthly_records(daily_records: &[DailyRecord]) -> Vec<MonthlyRecord> {
    let mut groups: BTreeMap<(i32, u8), Vec<DailyRecord>> = BTreeMap::new();
    for record in daily_records {
        let key = (record.date.year(), record.date.month() as u8 - 1);
        groups.entry(key).or_default().push(*record);
    }

    groups
        .into_iter()
        .map(|((year, month), mut values)| {
            values.sort_by_key(|record| record.date);
            let max_value = values
                .iter()
                .map(|record| record.max)
                .max_by(|left, right| left.total_cmp(right))
                .unwrap();
            let min_value = values
                .iter()
                .map(|record| record.min)
                .min_by(|left, right| left.total_cmp(right))
                .unwrap();
            let month_date = values[0].date.replace_day(1).unwrap();
            MonthlyRecord { year, month, month_date, values, max_value, min_value }
        })
        .collect()
}

/// A discrete domain mapped onto equal-width slots with no gap.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale<T> {
    domain: Vec<T>,
    step: f32,
}

impl<T: PartialEq> BandScale<T> {
    pub fn new(domain: Vec<T>, step: f32) -> Self {
        Self { domain, step }
    }

    /// Offset of the slot owned by `key`, or `None` for a key outside the
    /// domain.
    pub fn position(&self, key: &T) -> Option<f32> {
        self.domain.iter().position(|d| d == key).map(|i| i as f32 * self.step)
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn domain(&self) -> &[T] {
        &self.domain
    }
}

/// A linear domain → range mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f32, f32),
    range: (f32, f32),
}

impl LinearScale {
    pub fn new(domain: (f32, f32), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f32, f32) {
        self.domain
    }

    pub fn range(&self) -> (f32, f32) {
        self.range
    }

    /// A zero-width domain maps every input to the middle of the range,
    /// and `NaN` maps to `NaN`.
    pub fn scale(&self, value: f32) -> f32 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 - d0 == 0.0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Rounds the domain bounds outward to multiples of a 1/2/5 tick step,
    /// so sparklines sit on round value bounds. Zero-width and non-finite
    /// domains pass through untouched.
    pub fn nice(mut self) -> Self {
        let (d0, d1) = self.domain;
        let span = d1 - d0;
        if span == 0.0 || !span.is_finite() {
            return self;
        }
        let (mut lo, mut hi) = (d0 as f64, d1 as f64);
        let mut prestep = f64::NAN;
        for _ in 0..10 {
            let step = tick_increment(lo, hi, 10.0);
            if step == prestep {
                self.domain = (lo as f32, hi as f32);
                return self;
            } else if step > 0.0 {
                lo = (lo / step).floor() * step;
                hi = (hi / step).ceil() * step;
            } else if step < 0.0 {
                lo = (lo * step).ceil() / step;
                hi = (hi * step).floor() / step;
            } else {
                break;
            }
            prestep = step;
        }
        self
    }
}

// Tick step for roughly `count` ticks over [start, stop], snapped to a
// 1/2/5 times power-of-ten ladder. A negative return encodes the inverse
// of the step, which keeps sub-unit steps exact.
fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    let step = (stop - start) / count;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -(10f64.powf(-power)) / factor
    }
}

/// Round tick values covering `[start, stop]`, roughly `count` of them.
pub fn ticks(start: f32, stop: f32, count: usize) -> Vec<f32> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop as f64, start as f64) } else { (start as f64, stop as f64) };
    let step = tick_increment(lo, hi, count as f64);
    if step == 0.0 || !step.is_finite() {
        return Vec::new();
    }
    let mut out: Vec<f32> = if step > 0.0 {
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        (first..=last).map(|i| (i as f64 * step) as f32).collect()
    } else {
        let inverse = -step;
        let first = (lo * inverse).ceil() as i64;
        let last = (hi * inverse).floor() as i64;
        (first..=last).map(|i| (i as f64 / inverse) as f32).collect()
    };
    if reverse {
        out.reverse();
    }
    out
}

/// Grid geometry shared by every cell: one column per year, twelve rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Distinct years present in the data, ascending.
    pub years: Vec<i32>,
    pub cell_width: f32,
    pub chart_width: f32,
    pub chart_height: f32,
    pub x_scale: BandScale<i32>,
    pub y_scale: BandScale<u8>,
}

/// Derives the grid from the years present in the records.
///
/// The cell width is the floor of the inner width divided by the year
/// count; remainder pixels stay unused on the right. All twelve month rows
/// always exist, a year with missing months just leaves those cells absent.
///
/// # Panics
///
/// Panics when `monthly_records` is empty. Callers must aggregate at least
/// one record before laying out a chart.
pub fn create_layout(monthly_records: &[MonthlyRecord], config: &ChartConfig) -> Layout {
    let mut years: Vec<i32> = monthly_records.iter().map(|record| record.year).collect();
    years.sort_unstable();
    years.dedup();
    assert!(!years.is_empty(), "cannot lay out a chart over zero monthly records");

    let inner_width = config.svg.width - config.svg.margin.left - config.svg.margin.right;
    let cell_width = (inner_width / years.len() as f32).floor();
    let chart_width = years.len() as f32 * cell_width;
    let chart_height = 12.0 * config.cell.height;

    let x_scale = BandScale::new(years.clone(), cell_width);
    let y_scale = BandScale::new((0..12).collect(), config.cell.height);

    Layout { years, cell_width, chart_width, chart_height, x_scale, y_scale }
}

/// Which daily value a sparkline traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trace {
    Max,
    Min,
}

/// The two sparkline coordinate paths of one cell, in cell-local pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGeometry {
    pub max_path: Vec<(f32, f32)>,
    pub min_path: Vec<(f32, f32)>,
}

/// Tooltip payload for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverInfo {
    pub month_label: String,
    pub max_value: f32,
    pub min_value: f32,
}

/// Everything a renderer needs to draw one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Offset of the cell within the chart area.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Rgb,
    pub bordered: bool,
    pub geometry: CellGeometry,
    pub hover: HoverInfo,
}

/// The vertical scale shared by both sparklines of a cell.
///
/// Its domain spans the full max-to-min range of the month so the two
/// traces sit correctly relative to each other, niced to round bounds;
/// the range is inverted because pixel y grows downward.
pub fn cell_y_scale(record: &MonthlyRecord, cell: &CellConfig) -> LinearScale {
    let lo = record
        .values
        .iter()
        .flat_map(|day| [day.max, day.min])
        .min_by(|left, right| left.total_cmp(right))
        .unwrap();
    let hi = record
        .values
        .iter()
        .flat_map(|day| [day.max, day.min])
        .max_by(|left, right| left.total_cmp(right))
        .unwrap();
    LinearScale::new((lo, hi), (cell.height - cell.spark_pad_y, cell.spark_pad_y)).nice()
}

/// Coordinates of one sparkline, spread evenly across the padded cell
/// interior and mapped through the shared vertical scale.
pub fn spark_points(
    record: &MonthlyRecord,
    trace: Trace,
    cell_width: f32,
    y_scale: &LinearScale,
    cell: &CellConfig,
) -> Vec<(f32, f32)> {
    // Guard against single-day months to avoid division by zero; the lone
    // point lands at the left padding offset.
    let last_index = (record.values.len() - 1).max(1) as f32;
    let span = cell_width - 2.0 * cell.spark_pad_x;
    record
        .values
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let value = match trace {
                Trace::Max => day.max,
                Trace::Min => day.min,
            };
            (cell.spark_pad_x + (i as f32 / last_index) * span, y_scale.scale(value))
        })
        .collect()
}

/// Builds both sparkline paths of a cell from one shared vertical scale.
pub fn build_cell_geometry(
    record: &MonthlyRecord,
    cell_width: f32,
    cell: &CellConfig,
) -> CellGeometry {
    let y_scale = cell_y_scale(record, cell);
    CellGeometry {
        max_path: spark_points(record, Trace::Max, cell_width, &y_scale, cell),
        min_path: spark_points(record, Trace::Min, cell_width, &y_scale, cell),
    }
}

/// Runs the per-cell stage over every monthly record: grid offsets from
/// the layout's band scales, fill from the monthly maximum on the fixed
/// color scale, sparkline paths and the hover payload.
pub fn build_cells(
    monthly_records: &[MonthlyRecord],
    layout: &Layout,
    config: &ChartConfig,
) -> Vec<Cell> {
    let colors = ColorScale::new(config.temp_domain);
    monthly_records
        .iter()
        .map(|record| Cell {
            // The layout was derived from these records, both lookups hit
            x: layout.x_scale.position(&record.year).unwrap(),
            y: layout.y_scale.position(&record.month).unwrap(),
            width: layout.cell_width,
            height: config.cell.height,
            fill: colors.color_for(record.max_value),
            bordered: true,
            geometry: build_cell_geometry(record, layout.cell_width, &config.cell),
            hover: HoverInfo {
                month_label: record.month_label(),
                max_value: record.max_value,
                min_value: record.min_value,
            },
        })
        .collect()
}

/// One tick of the legend axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendTick {
    pub value: f32,
    pub y: f32,
    pub label: String,
}

/// Gradient stops for the legend bar: `steps` evenly spaced offset
/// fractions in `[0, 1]`, colored through the same scale as the cells so
/// the bar matches continuous interpolation at the sampled points.
///
/// # Panics
///
/// Panics when `steps < 2`, a gradient needs both end stops.
pub fn build_legend_stops(colors: &ColorScale, steps: usize) -> Vec<(f32, Rgb)> {
    assert!(steps >= 2, "a gradient needs at least its two end stops");
    let (lo, hi) = colors.domain();
    (0..steps)
        .map(|i| {
            let t = i as f32 / (steps - 1) as f32;
            (t, colors.color_for(lo + t * (hi - lo)))
        })
        .collect()
}

/// The legend axis: temperature → vertical pixel position along the bar.
/// Unlike the cell fill this is not clamped, the domain bounds are the
/// tick extremes.
pub fn legend_axis(colors: &ColorScale, legend_top: f32, bar_height: f32) -> LinearScale {
    LinearScale::new(colors.domain(), (legend_top, legend_top + bar_height))
}

/// Tick positions and labels along the legend bar.
pub fn legend_ticks(
    colors: &ColorScale,
    legend_top: f32,
    bar_height: f32,
    count: usize,
) -> Vec<LegendTick> {
    let axis = legend_axis(colors, legend_top, bar_height);
    let (lo, hi) = colors.domain();
    ticks(lo, hi, count)
        .into_iter()
        .map(|value| LegendTick { value, y: axis.scale(value), label: format!("{value:.0} Celsius") })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u8, day: u8, max: f32, min: f32) -> DailyRecord {
        let date = Date::from_calendar_date(year, Month::try_from(month).unwrap(), day).unwrap();
        DailyRecord { date, max, min }
    }

    #[test]
    fn parses_a_well_formed_table() {
        let series: DailySeries = "date,max_temperature,min_temperature\n\
                                   2020-01-05,10,2\n\
                                   2020-01-15,20.5,-5\n"
            .parse()
            .unwrap();
        assert_eq!(series.records.len(), 2);
        assert_eq!(series.skipped_rows, 0);
        assert_eq!(series.nan_fields, 0);
        assert_eq!(series.records[1].max, 20.5);
        assert_eq!(series.records[1].min, -5.0);
    }

    #[test]
    fn drops_rows_with_unreadable_dates() {
        let series: DailySeries = "date,max_temperature,min_temperature\n\
                                   oops,1,2\n\
                                   2020-13-40,1,2\n\
                                   2020-02-30,1,2\n\
                                   2020-02-29,1,2\n"
            .parse()
            .unwrap();
        // 2020 is a leap year, only the last row survives.
        assert_eq!(series.records.len(), 1);
        assert_eq!(series.skipped_rows, 3);
    }

    #[test]
    fn malformed_numbers_degrade_to_nan() {
        let series: DailySeries = "date,max_temperature,min_temperature\n\
                                   2020-01-05,abc,2\n\
                                   2020-01-06,---,\n\
                                   2020-01-07,7,3\n"
            .parse()
            .unwrap();
        assert_eq!(series.records.len(), 3);
        assert_eq!(series.nan_fields, 3);
        assert!(series.records[0].max.is_nan());
        assert_eq!(series.records[0].min, 2.0);
        assert!(series.records[1].max.is_nan());
        assert!(series.records[1].min.is_nan());
    }

    #[test]
    fn rejects_a_missing_or_bad_header() {
        assert!(matches!("".parse::<DailySeries>(), Err(ParseError::MissingHeader)));
        assert!(matches!(
            "date,humidity,min_temperature\n".parse::<DailySeries>(),
            Err(ParseError::BadHeader(_))
        ));
    }

    #[test]
    fn groups_by_calendar_month_and_sorts() {
        let records = [
            day(2020, 2, 10, 5.0, -1.0),
            day(2020, 1, 15, 20.0, -5.0),
            day(2020, 1, 5, 10.0, 2.0),
        ];
        let monthly = to_monthly_records(&records);
        assert_eq!(monthly.len(), 2);
        assert!(monthly.windows(2).all(|w| w[0].month_date < w[1].month_date));

        let january = &monthly[0];
        assert_eq!((january.year, january.month), (2020, 0));
        assert_eq!(january.month_date.day(), 1);
        assert!(january.values.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(january.max_value, 20.0);
        assert_eq!(january.min_value, -5.0);
        assert_eq!(monthly[1].values.len(), 1);
    }

    #[test]
    fn every_valid_record_lands_in_exactly_one_month() {
        let records: Vec<_> = (1..=28)
            .flat_map(|d| [day(2019, 12, d, d as f32, 0.0), day(2020, 3, d, d as f32, 0.0)])
            .collect();
        let monthly = to_monthly_records(&records);
        assert_eq!(monthly.iter().map(|m| m.values.len()).sum::<usize>(), records.len());
        for month in &monthly {
            assert!(month
                .values
                .iter()
                .all(|v| (v.date.year(), v.date.month() as u8 - 1) == (month.year, month.month)));
        }
    }

    #[test]
    fn extrema_match_a_direct_recomputation() {
        // Pseudo-random but deterministic dataset, a small LCG is enough.
        let mut state: u64 = 0x9e3779b97f4a7c15;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) % 1000) as f32 / 10.0 - 20.0
        };
        let mut records = Vec::new();
        for month in 1..=12u8 {
            for d in 1..=28u8 {
                let min = next();
                records.push(day(2021, month, d, min + next().abs() * 0.3, min));
            }
        }
        let monthly = to_monthly_records(&records);
        assert_eq!(monthly.len(), 12);
        for month in &monthly {
            let direct_max =
                month.values.iter().map(|v| v.max).fold(f32::NEG_INFINITY, f32::max);
            let direct_min = month.values.iter().map(|v| v.min).fold(f32::INFINITY, f32::min);
            assert_eq!(month.max_value, direct_max);
            assert_eq!(month.min_value, direct_min);
        }
    }

    #[test]
    fn aggregation_of_nothing_is_nothing() {
        assert!(to_monthly_records(&[]).is_empty());
    }

    #[test]
    fn nan_degrades_extrema_without_panicking() {
        let records = [day(2020, 1, 1, 10.0, 2.0), day(2020, 1, 2, f32::NAN, f32::NAN)];
        let monthly = to_monthly_records(&records);
        // Total order puts NaN above every finite value.
        assert!(monthly[0].max_value.is_nan());
        assert_eq!(monthly[0].min_value, 2.0);
        // Geometry stays non-fatal, coordinates just turn NaN.
        let geometry = build_cell_geometry(&monthly[0], 100.0, &ChartConfig::default().cell);
        assert_eq!(geometry.max_path.len(), 2);
    }

    #[test]
    fn layout_floors_the_cell_width() {
        let config = ChartConfig::default();
        let records = to_monthly_records(&[
            day(2019, 6, 1, 25.0, 12.0),
            day(2020, 6, 1, 26.0, 13.0),
            day(2021, 6, 1, 27.0, 14.0),
        ]);
        let layout = create_layout(&records, &config);
        assert_eq!(layout.years, vec![2019, 2020, 2021]);
        // floor(910 / 3) = 303, one remainder pixel stays unused.
        assert_eq!(layout.cell_width, 303.0);
        assert_eq!(layout.chart_width, 909.0);
        assert_eq!(layout.chart_height, 624.0);
        assert_eq!(layout.x_scale.position(&2020), Some(303.0));
        assert_eq!(layout.x_scale.position(&2018), None);
        // All twelve rows exist even though only June has data.
        assert_eq!(layout.y_scale.domain().len(), 12);
        assert_eq!(layout.y_scale.position(&11), Some(11.0 * 52.0));
    }

    #[test]
    fn layout_is_deterministic() {
        let config = ChartConfig::default();
        let records =
            to_monthly_records(&[day(2019, 6, 1, 25.0, 12.0), day(2020, 6, 1, 26.0, 13.0)]);
        assert_eq!(create_layout(&records, &config), create_layout(&records, &config));
    }

    #[test]
    #[should_panic]
    fn layout_refuses_zero_records() {
        create_layout(&[], &ChartConfig::default());
    }

    #[test]
    fn color_scale_clamps_at_the_domain_bounds() {
        let colors = ColorScale::default();
        assert_eq!(colors.color_for(-10.0), colors.color_for(0.0));
        assert_eq!(colors.color_for(50.0), colors.color_for(40.0));
        assert_ne!(colors.color_for(0.0), colors.color_for(40.0));
        assert_eq!(colors.color_for(f32::NAN), colors.color_for(0.0));
    }

    #[test]
    fn turbo_endpoints() {
        assert_eq!(turbo(0.0), Rgb([35, 23, 27]));
        assert_eq!(turbo(1.0), Rgb([144, 12, 0]));
        assert_eq!(Rgb([0x22, 0xa8, 0x4a]).to_hex(), "#22a84a");
    }

    #[test]
    fn nice_rounds_the_domain_outward() {
        let scale = LinearScale::new((-5.0, 20.0), (47.0, 5.0)).nice();
        assert_eq!(scale.domain(), (-6.0, 20.0));
        let scale = LinearScale::new((0.13, 0.87), (47.0, 5.0)).nice();
        let (lo, hi) = scale.domain();
        assert!((lo - 0.1).abs() < 1e-6 && (hi - 0.9).abs() < 1e-6);
    }

    #[test]
    fn flat_months_map_to_the_range_midpoint() {
        let scale = LinearScale::new((5.0, 5.0), (47.0, 5.0)).nice();
        assert_eq!(scale.domain(), (5.0, 5.0));
        assert_eq!(scale.scale(5.0), 26.0);
        assert_eq!(scale.scale(99.0), 26.0);
    }

    #[test]
    fn round_ticks_cover_the_domain() {
        assert_eq!(ticks(0.0, 40.0, 5), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(ticks(0.0, 1.0, 2), vec![0.0, 0.5, 1.0]);
        assert_eq!(ticks(3.0, 3.0, 5), vec![3.0]);
        assert!(ticks(0.0, 40.0, 0).is_empty());
    }

    #[test]
    fn a_single_day_month_degenerates_to_one_point() {
        let config = ChartConfig::default();
        let monthly = to_monthly_records(&[day(2020, 2, 10, 5.0, -1.0)]);
        let geometry = build_cell_geometry(&monthly[0], 303.0, &config.cell);
        assert_eq!(geometry.max_path.len(), 1);
        assert_eq!(geometry.min_path.len(), 1);
        // The lone point sits at the left padding offset, not centered.
        assert_eq!(geometry.max_path[0].0, config.cell.spark_pad_x);
        assert_eq!(geometry.min_path[0].0, config.cell.spark_pad_x);
    }

    #[test]
    fn both_traces_share_one_vertical_scale() {
        let config = ChartConfig::default();
        // One day's max equals the other day's min, their y must coincide.
        let monthly =
            to_monthly_records(&[day(2020, 1, 1, 10.0, 0.0), day(2020, 1, 2, 20.0, 10.0)]);
        let geometry = build_cell_geometry(&monthly[0], 100.0, &config.cell);
        assert_eq!(geometry.max_path[0].1, geometry.min_path[1].1);

        // And both paths reproduce from the one scale instance.
        let y_scale = cell_y_scale(&monthly[0], &config.cell);
        for (path, trace) in [(&geometry.max_path, Trace::Max), (&geometry.min_path, Trace::Min)] {
            let expected = spark_points(&monthly[0], trace, 100.0, &y_scale, &config.cell);
            assert_eq!(path, &expected);
        }
    }

    #[test]
    fn sparkline_y_grows_downward_for_colder_values() {
        let config = ChartConfig::default();
        let monthly =
            to_monthly_records(&[day(2020, 1, 1, 20.0, -5.0), day(2020, 1, 2, 10.0, 2.0)]);
        let geometry = build_cell_geometry(&monthly[0], 100.0, &config.cell);
        // The hottest value sits closest to the top of the cell.
        assert!(geometry.max_path[0].1 < geometry.max_path[1].1);
        assert!(geometry.max_path[0].1 < geometry.min_path[0].1);
    }

    #[test]
    fn cells_carry_fill_offsets_and_hover_payload() {
        let config = ChartConfig::default();
        let monthly =
            to_monthly_records(&[day(2020, 1, 15, 20.0, -5.0), day(2021, 3, 2, 15.0, 4.0)]);
        let layout = create_layout(&monthly, &config);
        let cells = build_cells(&monthly, &layout, &config);
        assert_eq!(cells.len(), 2);
        assert_eq!((cells[0].x, cells[0].y), (0.0, 0.0));
        assert_eq!((cells[1].x, cells[1].y), (layout.cell_width, 2.0 * config.cell.height));
        assert_eq!(cells[0].fill, ColorScale::new(config.temp_domain).color_for(20.0));
        assert!(cells[0].bordered);
        assert_eq!(cells[0].hover.month_label, "2020-01");
        assert_eq!(cells[0].hover.max_value, 20.0);
        assert_eq!(cells[0].hover.min_value, -5.0);
    }

    #[test]
    fn legend_stops_are_evenly_spaced_and_match_the_cells() {
        let colors = ColorScale::default();
        let stops = build_legend_stops(&colors, 21);
        assert_eq!(stops.len(), 21);
        assert_eq!(stops[0], (0.0, colors.color_for(0.0)));
        assert_eq!(stops[20], (1.0, colors.color_for(40.0)));
        for pair in stops.windows(2) {
            assert!((pair[1].0 - pair[0].0 - 0.05).abs() < 1e-6);
        }
        // A mid-bar stop samples the very scale used for cell fills.
        assert_eq!(stops[10].1, colors.color_for(20.0));
    }

    #[test]
    fn legend_axis_ticks_span_the_bar() {
        let colors = ColorScale::default();
        let ticks = legend_ticks(&colors, 55.0, 260.0, 5);
        assert_eq!(ticks.len(), 5);
        assert_eq!(ticks[0].y, 55.0);
        assert_eq!(ticks[4].y, 315.0);
        assert_eq!(ticks[1].value, 10.0);
        assert_eq!(ticks[1].y, 120.0);
        assert_eq!(ticks[0].label, "0 Celsius");
    }
}
