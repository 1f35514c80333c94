//! Lookup formatter - renders records for the `lookup` command

use crate::database::GeoData;
use std::fmt::Write as FmtWrite;

#[cfg(feature = "colored-output")]
use colored::Colorize;

/// Render a record as a single line of JSON
pub fn format_json(record: &GeoData) -> Result<String, serde_json::Error> {
    serde_json::to_string(record)
}

fn header(ip: &str, use_color: bool) -> String {
    let line = format!("[ {:>15} ]---------------------->", ip);
    if use_color {
        #[cfg(feature = "colored-output")]
        {
            return line.bold().to_string();
        }
    }
    line
}

fn missing(use_color: bool) -> String {
    let line = "  Unable to find any valid data".to_string();
    if use_color {
        #[cfg(feature = "colored-output")]
        {
            return line.red().to_string();
        }
    }
    line
}

/// Render a record as an indented table
///
/// `None` or an unknown record prints a notice instead of fields.
pub fn format_table(ip: &str, record: Option<&GeoData>, use_color: bool) -> String {
    let mut out = String::new();

    writeln!(&mut out).unwrap();
    writeln!(&mut out, "{}", header(ip, use_color)).unwrap();

    let record = match record {
        Some(record) if !record.is_unknown() => record,
        _ => {
            writeln!(&mut out, "{}", missing(use_color)).unwrap();
            return out;
        }
    };

    if !record.continent.name.is_empty() {
        writeln!(
            &mut out,
            "  Continent:      [{} ({})]",
            record.continent.name, record.continent.code
        )
        .unwrap();
    }

    if !record.country.name.is_empty() {
        writeln!(
            &mut out,
            "  Country:        [{} ({})]",
            record.country.name, record.country.iso_code
        )
        .unwrap();
    }

    match record.subdivisions.as_slice() {
        [] => {}
        [only] => {
            writeln!(&mut out, "  Subdivision:    [{} ({})]", only.name, only.iso_code).unwrap();
        }
        many => {
            writeln!(&mut out, "  Subdivisions:").unwrap();
            for (idx, sub) in many.iter().enumerate() {
                writeln!(&mut out, "    {:02}:           [{} ({})]", idx, sub.name, sub.iso_code)
                    .unwrap();
            }
        }
    }

    if !record.city.name.is_empty() {
        writeln!(&mut out, "  City:           [{}]", record.city.name).unwrap();
    }

    if !record.postal.code.is_empty() {
        writeln!(&mut out, "  Postal:         [{:0>5}]", record.postal.code).unwrap();
    }

    if record.location.accuracy_radius != 0 {
        writeln!(&mut out, "  Location:").unwrap();
        writeln!(
            &mut out,
            "    Coordinates:  [{:.4}, {:.4} ({})]",
            record.location.latitude, record.location.longitude, record.location.accuracy_radius
        )
        .unwrap();
        if !record.location.time_zone.is_empty() {
            writeln!(&mut out, "    Timezone:     [{}]", record.location.time_zone).unwrap();
        }
    }

    out
}
