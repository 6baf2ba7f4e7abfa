/// Closed interval of whole seconds during which a peptide is expected to elute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElutionWindow {
    pub start: i64,
    pub stop: i64,
}

/// Largest accepted magnitude of a predicted elution time, in seconds (one day).
pub const MAX_RT_SECONDS: f64 = 86_400.0;

impl ElutionWindow {
    /// Builds the window `[round(time) - half_width, round(time) + half_width]`.
    ///
    /// A negative start is clamped to zero. The second element of the returned tuple
    /// reports whether that clamp was applied. Returns `None` for a time that is not finite
    /// or lies outside `±MAX_RT_SECONDS`.
    ///
    /// # Arguments
    ///
    /// * `predicted_rt_seconds` - Predicted elution time in seconds.
    /// * `half_width` - Number of seconds on either side of the prediction.
    pub fn around(predicted_rt_seconds: f64, half_width: u32) -> Option<(Self, bool)> {
        if !predicted_rt_seconds.is_finite() || predicted_rt_seconds.abs() > MAX_RT_SECONDS {
            return None;
        }
        let center = predicted_rt_seconds.round() as i64;
        let half_width = i64::from(half_width);
        let raw_start = center.checked_sub(half_width)?;
        let window = Self {
            start: raw_start.max(0),
            stop: center.checked_add(half_width)?,
        };
        Some((window, raw_start < 0))
    }

    /// Returns `true` if second `t` lies inside the window (both ends inclusive).
    #[inline]
    pub fn covers(&self, t: i64) -> bool {
        self.start <= t && t <= self.stop
    }
}

/// A candidate precursor that may be scheduled for targeting.
///
/// A peptide is identified by its sequence; every protein listing that sequence refers to
/// the same `Peptide` and therefore to the same decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Peptide {
    /// Identifier presented to the solver. Equal to the sequence unless identifiers were
    /// randomized during normalization.
    pub key: String,
    pub sequence: String,
    /// Modified form of the sequence as given in the catalog (may be empty).
    pub modified_sequence: String,
    pub predicted_rt_seconds: f64,
    pub window: ElutionWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_rounds_prediction_before_widening() {
        let (window, clamped) = ElutionWindow::around(100.6, 10).unwrap();
        assert_eq!(window, ElutionWindow { start: 91, stop: 111 });
        assert!(!clamped);
    }

    #[test]
    fn negative_start_is_clamped_and_reported() {
        let (window, clamped) = ElutionWindow::around(3.2, 5).unwrap();
        assert_eq!(window.start, 0);
        assert_eq!(window.stop, 8);
        assert!(clamped);
    }

    #[test]
    fn times_beyond_one_day_have_no_window() {
        assert!(ElutionWindow::around(MAX_RT_SECONDS + 1.0, 5).is_none());
        assert!(ElutionWindow::around(-1e19, 5).is_none());
        assert!(ElutionWindow::around(f64::NAN, 5).is_none());
        let (window, _) = ElutionWindow::around(MAX_RT_SECONDS, u32::MAX).unwrap();
        assert_eq!(window.stop, 86_400 + i64::from(u32::MAX));
    }

    #[test]
    fn covers_is_inclusive_on_both_ends() {
        let window = ElutionWindow { start: 5, stop: 15 };
        assert!(window.covers(5));
        assert!(window.covers(15));
        assert!(!window.covers(4));
        assert!(!window.covers(16));
    }
}
