use chrono::{DateTime, Utc};

/// Grape1 file name for one day of one station on one carrier.
pub fn station_filename(
    start: DateTime<Utc>,
    node: u32,
    grid_square: &str,
    frequency_label: &str,
    suffix: &str,
) -> String {
    format!(
        "{}_N{:07}_G_{}_FRQ_{}{}",
        start.format("%Y-%m-%dT%H%M%SZ"),
        node,
        grid_square,
        frequency_label,
        suffix
    )
}

/// Comment block written above the column header.
pub fn station_header(node: u32, grid_square: &str, frequency_label: &str, nominal_hz: f64) -> String {
    format!(
        "# Grape1 synthetic station log\n\
         # Node: N{node:07}\n\
         # Grid square: {grid_square}\n\
         # Frequency: {frequency_label} ({nominal_hz} Hz)\n\
         UTC,Freq,Vpk\n"
    )
}
