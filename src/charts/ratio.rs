//! Nil/zero-safe percentage-delta calculation.

/// Percentage delta of `current` against a reference value.
///
/// Returns `None` when the reference is absent, zero, or not a number — a
/// missing baseline must read as "no comparison", never as a 0% change.
/// Pure and total: no input combination errors.
pub fn ratio(current: f64, reference: Option<f64>) -> Option<f64> {
    let reference = reference?;
    if reference == 0.0 || !reference.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - reference) / reference * 100.0)
}
