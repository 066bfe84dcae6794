use std::str::FromStr;

use plotters::prelude::*;
use thermocal::{
    build_cells, build_legend_stops, create_layout, legend_ticks, to_monthly_records, ChartConfig,
    ColorScale, DailySeries, Rgb, MONTH_NAMES,
};

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0[0], rgb.0[1], rgb.0[2])
}

fn main() {
    let input = std::env::args().nth(1).expect("Missing filename");
    println!("opening {input}");
    let output = format!("{input}.png");
    let input = std::fs::read_to_string(input).unwrap();

    let series = DailySeries::from_str(&input).unwrap();
    if series.skipped_rows > 0 {
        eprintln!("{} rows had an unreadable date", series.skipped_rows);
    }

    let config = ChartConfig::default();
    let records = to_monthly_records(&series.records);
    let layout = create_layout(&records, &config);
    let cells = build_cells(&records, &layout, &config);

    let root = BitMapBackend::new(&output, (config.svg.width as u32, config.svg.height as u32))
        .into_drawing_area();
    root.fill(&WHITE).unwrap();

    let left = config.svg.margin.left;
    let top = config.svg.margin.top;

    for cell in &cells {
        let x0 = (left + cell.x) as i32;
        let y0 = (top + cell.y) as i32;
        let x1 = x0 + cell.width as i32;
        let y1 = y0 + cell.height as i32;

        root.draw(&Rectangle::new([(x0, y0), (x1, y1)], color(cell.fill).filled()))
            .unwrap();
        if cell.bordered {
            root.draw(&Rectangle::new(
                [(x0, y0), (x1, y1)],
                color(config.colors.border).stroke_width(1),
            ))
            .unwrap();
        }

        let to_pixels = |path: &[(f32, f32)]| {
            path.iter()
                .map(|&(x, y)| (x0 + x as i32, y0 + y as i32))
                .collect::<Vec<_>>()
        };
        root.draw(&PathElement::new(
            to_pixels(&cell.geometry.max_path),
            color(config.colors.max_line).stroke_width(1),
        ))
        .unwrap();
        root.draw(&PathElement::new(
            to_pixels(&cell.geometry.min_path),
            color(config.colors.min_line).stroke_width(1),
        ))
        .unwrap();
    }

    // Year labels above each column, month labels left of each row.
    for year in &layout.years {
        let x = left + layout.x_scale.position(year).unwrap() + layout.cell_width / 2.0;
        root.draw(&Text::new(
            year.to_string(),
            (x as i32 - 15, top as i32 - 20),
            ("sans-serif", 16).into_font(),
        ))
        .unwrap();
    }
    for (month, name) in MONTH_NAMES.iter().enumerate() {
        let y = top + layout.y_scale.position(&(month as u8)).unwrap() + config.cell.height / 2.0;
        root.draw(&Text::new(
            *name,
            (left as i32 - 80, y as i32 - 6),
            ("sans-serif", 14).into_font(),
        ))
        .unwrap();
    }

    // Legend: gradient bar drawn as stacked bands, ticks to its right.
    let colors = ColorScale::new(config.temp_domain);
    let legend_x = (left + layout.chart_width + 30.0) as i32;
    let legend_y = top;
    for pair in build_legend_stops(&colors, 21).windows(2) {
        let y0 = (legend_y + pair[0].0 * config.legend.bar_height) as i32;
        let y1 = (legend_y + pair[1].0 * config.legend.bar_height) as i32;
        root.draw(&Rectangle::new(
            [(legend_x, y0), (legend_x + config.legend.bar_width as i32, y1)],
            color(pair[0].1).filled(),
        ))
        .unwrap();
    }
    for tick in legend_ticks(&colors, legend_y, config.legend.bar_height, config.legend.tick_count)
    {
        root.draw(&Text::new(
            tick.label,
            (legend_x + config.legend.bar_width as i32 + 6, tick.y as i32 - 6),
            ("sans-serif", 14).into_font(),
        ))
        .unwrap();
    }

    root.present().unwrap();
    println!("wrote {output}");
}
