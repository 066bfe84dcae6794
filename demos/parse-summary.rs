use std::str::FromStr;

use miette::{IntoDiagnostic, Result};
use thermocal::{to_monthly_records, DailySeries};

fn main() -> Result<()> {
    let input = std::env::args().nth(1).expect("Missing filename");
    println!("opening {input}");
    let input = std::fs::read_to_string(input).into_diagnostic()?;

    let series = DailySeries::from_str(&input)?;
    if series.skipped_rows > 0 {
        eprintln!("{} rows had an unreadable date", series.skipped_rows);
    }
    if series.nan_fields > 0 {
        eprintln!("{} numeric fields could not be read", series.nan_fields);
    }

    for record in to_monthly_records(&series.records) {
        println!(
            "{}: max {:5.1} min {:5.1} over {} days",
            record.month_label(),
            record.max_value,
            record.min_value,
            record.values.len()
        );
    }

    Ok(())
}
