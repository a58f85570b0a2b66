/// Arithmetic mean with compensated (Kahan) summation, or `None` for an
/// empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut correction = 0.0;
    let mut count = 0usize;

    for value in values {
        kahan_add(&mut sum, &mut correction, value);
        count += 1;
    }

    (count > 0).then(|| sum / count as f64)
}

/// Rounds to `decimals` digits, resolving ties to the even neighbour.
///
/// The scaled value is rounded, so `round_to_decimals(0.125, 2)` is `0.12`
/// while `round_to_decimals(0.375, 2)` is `0.38`. NaN and infinities pass
/// through unchanged.
pub fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Median of `values`; even-length inputs average the two middle samples.
///
/// The slice is reordered in place.
pub fn median_in_place(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    let middle = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[middle - 1] + values[middle]) / 2.0)
    } else {
        Some(values[middle])
    }
}

pub fn format_numeric(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }

    if value == f64::INFINITY {
        return "inf".to_string();
    }

    if value == f64::NEG_INFINITY {
        return "-inf".to_string();
    }

    format!("{value:.6}")
}

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}
