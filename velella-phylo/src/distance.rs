//! Jukes-Cantor distance correction.

use velella_core::{Result, VelellaError};

/// Jukes-Cantor distance from an observed substitution frequency `p`:
/// `d = -3/4 * ln(1 - 4p/3)`.
///
/// The transform is only defined for `p` in `[0, 0.75)`; outside that
/// domain an error is returned and the scoring stage substitutes its
/// configured default distance (saturation policy).
pub fn jukes_cantor(p: f64) -> Result<f64> {
    if !(0.0..0.75).contains(&p) {
        return Err(VelellaError::InvalidInput(format!(
            "substitution frequency {} outside the Jukes-Cantor domain [0, 0.75)",
            p
        )));
    }
    if p == 0.0 {
        return Ok(0.0);
    }
    Ok(-0.75 * (1.0 - p * (4.0 / 3.0)).ln())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical() {
        assert_eq!(jukes_cantor(0.0).unwrap(), 0.0);
    }

    #[test]
    fn known_value() {
        // p = 0.5: d = -0.75 * ln(1/3)
        let d = jukes_cantor(0.5).unwrap();
        assert!((d - (-0.75 * (1.0f64 / 3.0).ln())).abs() < 1e-12);
    }

    #[test]
    fn saturation_is_an_error() {
        assert!(jukes_cantor(0.75).is_err());
        assert!(jukes_cantor(0.9).is_err());
    }

    #[test]
    fn negative_is_an_error() {
        assert!(jukes_cantor(-0.1).is_err());
    }

    #[test]
    fn strictly_monotone_below_saturation() {
        let mut last = -1.0;
        for i in 0..74 {
            let p = i as f64 / 100.0;
            let d = jukes_cantor(p).unwrap();
            assert!(d > last, "JC not monotone at p = {}", p);
            last = d;
        }
    }
}
