/// Render a float the way the status line and history keys expect it:
/// integral values keep one decimal (`42.0`), everything else uses the
/// shortest representation that round-trips (`95.33333333333333`).
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
