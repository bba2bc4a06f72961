use std::time::Duration;

/// Seconds with one decimal, the way the timers are displayed ("2.9")
pub fn format_tenths(d: Duration) -> String {
    let tenths = (d.as_millis() + 50) / 100;
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Maps a play-area coordinate to the terminal cell it is drawn in
pub fn to_cell(coord: f64) -> u16 {
    coord.round().clamp(0.0, u16::MAX as f64) as u16
}
