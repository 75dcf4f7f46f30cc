//! CSV export for the recorded steady-state day.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::result::HourRecord;

/// Decimal places written for every energy column.
pub const DECIMALS: i32 = 3;

/// Column header, one row per hour below it.
pub const HEADER: &str = "hour,solar_kwh,household_kwh,ev_kwh,ev_from_solar,ev_from_battery,\
                          ev_from_grid,household_from_grid,battery_charge_kwh,\
                          battery_discharge_kwh,battery_level_kwh,grid_supply_kwh,\
                          grid_export_kwh,curtailed_kwh";

/// Exports hourly records to a CSV file at the given path.
///
/// Values are rounded for presentation; the records themselves are not
/// modified. Produces deterministic output for identical inputs.
///
/// # Arguments
///
/// * `records` - Recorded steady-state day
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[HourRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes hourly records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[HourRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    let d = DECIMALS as usize;
    for r in records.iter().map(|r| r.rounded(DECIMALS)) {
        wtr.write_record(&[
            r.hour.to_string(),
            format!("{:.d$}", r.solar_kwh),
            format!("{:.d$}", r.household_kwh),
            format!("{:.d$}", r.ev_kwh),
            format!("{:.d$}", r.ev_from_solar),
            format!("{:.d$}", r.ev_from_battery),
            format!("{:.d$}", r.ev_from_grid),
            format!("{:.d$}", r.household_from_grid),
            format!("{:.d$}", r.battery_charge_kwh),
            format!("{:.d$}", r.battery_discharge_kwh),
            format!("{:.d$}", r.battery_level_kwh),
            format!("{:.d$}", r.grid_supply_kwh),
            format!("{:.d$}", r.grid_export_kwh),
            format!("{:.d$}", r.curtailed_kwh),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
