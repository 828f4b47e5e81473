pub struct StatsHelper;

impl StatsHelper {
    /// Minimum and maximum over the defined values, or `None` when there are none.
    pub fn finite_range<I>(values: I) -> Option<(f64, f64)>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        values
            .into_iter()
            .flatten()
            .filter(|value| value.is_finite())
            .fold(None, |range, value| match range {
                None => Some((value, value)),
                Some((min, max)) => Some((min.min(value), max.max(value))),
            })
    }

    pub fn count_defined<I>(values: I) -> usize
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        values
            .into_iter()
            .flatten()
            .filter(|value| value.is_finite())
            .count()
    }

    /// Evenly spaced positions from `start` to `end` inclusive.
    pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
        match points {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (end - start) / (points - 1) as f64;
                (0..points).map(|i| start + step * i as f64).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_range_skips_missing_values() {
        let range = StatsHelper::finite_range(vec![None, Some(3.0), Some(-1.0), Some(f64::NAN)]);
        assert_eq!(range, Some((-1.0, 3.0)));
        assert_eq!(StatsHelper::finite_range(vec![None, None]), None);
    }

    #[test]
    fn linspace_includes_both_ends() {
        assert_eq!(StatsHelper::linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
        assert_eq!(StatsHelper::linspace(2.0, 5.0, 1), vec![2.0]);
        assert!(StatsHelper::linspace(0.0, 1.0, 0).is_empty());
    }
}
