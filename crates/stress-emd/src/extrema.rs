//! Local extrema detection

/// Indices of the local maxima and minima of a signal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extrema {
    pub maxima: Vec<usize>,
    pub minima: Vec<usize>,
}

impl Extrema {
    pub fn count(&self) -> usize {
        self.maxima.len() + self.minima.len()
    }

    /// Both envelopes can be built
    pub fn can_envelope(&self) -> bool {
        !self.maxima.is_empty() && !self.minima.is_empty()
    }
}

/// Find interior local extrema
///
/// A flat run strictly above (below) both of its neighbours counts as one
/// maximum (minimum) located at the middle of the run. End points are never
/// extrema; runs touching either end are ignored.
pub fn find_extrema(x: &[f64]) -> Extrema {
    let mut extrema = Extrema::default();
    let n = x.len();
    if n < 3 {
        return extrema;
    }

    let mut i = 1;
    while i + 1 < n {
        let mut j = i;
        while j + 1 < n && x[j + 1] == x[i] {
            j += 1;
        }
        if j + 1 >= n {
            break;
        }

        let (prev, next) = (x[i - 1], x[j + 1]);
        let mid = (i + j) / 2;
        if x[i] > prev && x[i] > next {
            extrema.maxima.push(mid);
        } else if x[i] < prev && x[i] < next {
            extrema.minima.push(mid);
        }
        i = j + 1;
    }
    extrema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_peaks_and_troughs() {
        let x = [0.0, 1.0, 0.0, -1.0, 0.0, 2.0, 0.0];
        let e = find_extrema(&x);
        assert_eq!(e.maxima, vec![1, 5]);
        assert_eq!(e.minima, vec![3]);
        assert_eq!(e.count(), 3);
    }

    #[test]
    fn test_plateau_reports_middle() {
        let x = [0.0, 1.0, 1.0, 1.0, 0.0, -1.0, -1.0, 0.0];
        let e = find_extrema(&x);
        assert_eq!(e.maxima, vec![2]);
        assert_eq!(e.minima, vec![5]);
    }

    #[test]
    fn test_step_is_not_an_extremum() {
        let x = [0.0, 1.0, 1.0, 2.0, 3.0];
        assert_eq!(find_extrema(&x), Extrema::default());
    }

    #[test]
    fn test_monotonic_and_short_signals() {
        let ramp: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert_eq!(find_extrema(&ramp).count(), 0);
        assert_eq!(find_extrema(&[1.0, 0.0]).count(), 0);
        assert!(!find_extrema(&[0.0, 1.0, 0.0]).can_envelope());
    }
}
