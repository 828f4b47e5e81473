use std::f64::consts::PI;

/// Idealised vegetation index for an ordinal day: annual cosine peaking mid-year.
pub fn seasonal_index(ordinal: f64, mean: f64, amplitude: f64) -> f64 {
    // Ordinal day 182 falls on 1 July of year 1, so peaks land in early summer.
    mean + amplitude * (2.0 * PI * (ordinal - 182.0) / 365.25).cos()
}

/// Red/NIR reflectance pair whose normalized difference equals `index`.
pub fn reflectance_pair(index: f64, red: f64) -> (f64, f64) {
    let index = index.clamp(-0.95, 0.95);
    (red, red * (1.0 + index) / (1.0 - index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflectance_pair_reproduces_index() {
        let (red, nir) = reflectance_pair(0.6, 0.05);
        assert!(((nir - red) / (nir + red) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn seasonal_index_stays_within_amplitude() {
        for day in 0..730 {
            let value = seasonal_index(730_000.0 + day as f64, 0.5, 0.25);
            assert!((0.25 - 1e-9..=0.75 + 1e-9).contains(&value));
        }
    }
}
