//! Summary statistics over Monte Carlo samples.
//!
//! Standard deviation is the population form (divide by n). Percentiles
//! interpolate linearly between order statistics at rank `(n − 1) · p`,
//! so the median is the 50th percentile and p0/p100 are the extremes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableStats {
    pub promedio:            f64,
    pub mediana:             f64,
    pub desviacion_estandar: f64,
    pub percentil_5:         f64,
    pub percentil_25:        f64,
    pub percentil_75:        f64,
    pub percentil_95:        f64,
    pub minimo:              f64,
    pub maximo:              f64,
}

impl VariableStats {
    /// `None` for an empty sample.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mean = mean(&sorted);
        Some(Self {
            promedio:            mean,
            mediana:             percentile_sorted(&sorted, 0.50),
            desviacion_estandar: population_std(&sorted, mean),
            percentil_5:         percentile_sorted(&sorted, 0.05),
            percentil_25:        percentile_sorted(&sorted, 0.25),
            percentil_75:        percentile_sorted(&sorted, 0.75),
            percentil_95:        percentile_sorted(&sorted, 0.95),
            minimo:              sorted[0],
            maximo:              sorted[sorted.len() - 1],
        })
    }
}

pub fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

fn population_std(samples: &[f64], mean: f64) -> f64 {
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    var.sqrt()
}

/// Percentile `p` in [0, 1] of an ascending, non-empty slice.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Median of an unsorted, non-empty sample.
pub fn median(samples: &[f64]) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_has_no_stats() {
        assert!(VariableStats::from_samples(&[]).is_none());
    }

    #[test]
    fn single_sample_collapses_every_statistic() {
        let s = VariableStats::from_samples(&[4.2]).unwrap();
        assert_eq!(s.promedio, 4.2);
        assert_eq!(s.mediana, 4.2);
        assert_eq!(s.percentil_5, 4.2);
        assert_eq!(s.percentil_95, 4.2);
        assert_eq!(s.desviacion_estandar, 0.0);
    }

    #[test]
    fn percentiles_interpolate_between_order_statistics() {
        // 1..=5: rank for p25 is 1.0, for p5 is 0.2.
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&sorted, 0.25), 2.0);
        assert_eq!(percentile_sorted(&sorted, 0.50), 3.0);
        assert!((percentile_sorted(&sorted, 0.05) - 1.2).abs() < 1e-12);
        assert!((percentile_sorted(&sorted, 0.95) - 4.8).abs() < 1e-12);
    }

    #[test]
    fn median_of_even_sample_is_midpoint() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn population_standard_deviation() {
        // Classic example: population sd of this set is exactly 2.
        let s = VariableStats::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((s.desviacion_estandar - 2.0).abs() < 1e-12);
        assert_eq!(s.promedio, 5.0);
        assert_eq!(s.minimo, 2.0);
        assert_eq!(s.maximo, 9.0);
    }

    #[test]
    fn ordering_holds_for_unsorted_input() {
        let samples: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 - 50.0).collect();
        let s = VariableStats::from_samples(&samples).unwrap();
        assert!(s.minimo <= s.percentil_5);
        assert!(s.percentil_5 <= s.percentil_25);
        assert!(s.percentil_25 <= s.mediana);
        assert!(s.mediana <= s.percentil_75);
        assert!(s.percentil_75 <= s.percentil_95);
        assert!(s.percentil_95 <= s.maximo);
    }
}
