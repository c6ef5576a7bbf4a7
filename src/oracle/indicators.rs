// Time-series smoothing used by the collection price oracle: TWAP over a
// sliding time window, EMA, and their linear blend.

use serde::{Deserialize, Serialize};

use crate::utils::math::floor;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub value: f64,
    pub timestamp: u64,
}

impl PriceSample {
    pub fn new(value: f64, timestamp: u64) -> Self {
        PriceSample { value, timestamp }
    }
}

/// Drops samples older than `window` relative to the newest one.
///
/// The newest sample at or before the window's left edge is kept, moved to
/// exactly `newest - window`, so the first interval still carries its weight.
/// `samples` must not be empty.
fn apply_window(window: u64, samples: &[PriceSample]) -> Vec<PriceSample> {
    let last_timestamp = samples.last().map(|x| x.timestamp).unwrap_or_default();
    let lower_boundary = last_timestamp - window.min(last_timestamp);

    let mut boundary_sample = samples.first().copied();
    let mut updated: Vec<PriceSample> = Vec::with_capacity(samples.len() + 1);

    for sample in samples {
        if sample.timestamp > lower_boundary {
            updated.push(*sample);
        } else {
            boundary_sample = Some(PriceSample::new(sample.value, lower_boundary));
        }
    }

    if let Some(boundary) = boundary_sample {
        let prepend = match updated.first() {
            // a boundary equal to the first sample in value adds no information
            Some(first) => boundary.timestamp != first.timestamp && boundary.value != first.value,
            None => true,
        };

        if prepend {
            updated.insert(0, boundary);
        }
    }

    updated
}

/// Appends `new_sample`, applies the window and returns `(twap, samples)`.
///
/// Each interval is weighted by its duration and valued at the sample that
/// opens it. A single retained sample is returned as is; an empty series
/// yields `0`.
pub fn calc_twap(
    window: u64,
    samples: &[PriceSample],
    new_sample: Option<PriceSample>,
) -> (f64, Vec<PriceSample>) {
    let mut samples = samples.to_vec();
    if let Some(sample) = new_sample {
        samples.push(sample);
    }

    if samples.is_empty() {
        return (0.0, samples);
    }

    let updated = apply_window(window, &samples);
    let first = match updated.first() {
        Some(first) => *first,
        None => return (0.0, updated),
    };

    if updated.len() == 1 {
        return (first.value, updated);
    }

    let mut prev = first;
    let mut period = 0.0;
    let mut product = 0.0;
    for sample in &updated {
        // a clock step back yields a negative interval, not a panic
        let interval = sample.timestamp as f64 - prev.timestamp as f64;
        period += interval;
        product += interval * prev.value;
        prev = *sample;
    }

    let twap = floor(if period != 0.0 { product / period } else { 0.0 }, 6);
    (twap, updated)
}

/// Exponential moving average with `k = 2 / (window_samples + 1)`.
///
/// An absent (or zero) previous value seeds the series with `new_value`.
pub fn calc_ema(window_samples: f64, new_value: f64, prev_ema: Option<f64>) -> f64 {
    match prev_ema.filter(|x| *x != 0.0) {
        None => new_value,
        Some(prev) => {
            let k = 2.0 / (window_samples + 1.0);
            floor(new_value * k + prev * (1.0 - k), 6)
        }
    }
}

pub fn calc_hybrid_average(twap: f64, ema: f64, twap_weight: f64) -> f64 {
    twap_weight * twap + (1.0 - twap_weight) * ema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::approx_eq;

    fn samples(list: &[(f64, u64)]) -> Vec<PriceSample> {
        list.iter().map(|(v, t)| PriceSample::new(*v, *t)).collect()
    }

    fn default_dataset() -> Vec<PriceSample> {
        samples(&[
            (100.0, 12),
            (110.0, 24),
            (90.0, 36),
            (115.0, 48),
            (105.0, 60),
            (95.0, 72),
            (110.0, 84),
            (120.0, 96),
            (115.0, 108),
        ])
    }

    const NEW_SAMPLE: PriceSample = PriceSample { value: 125.0, timestamp: 120 };

    #[test]
    fn test_twap_single_sample() {
        let (twap, list) = calc_twap(48, &[], Some(PriceSample::new(100.0, 12)));
        assert_eq!(twap, 100.0);
        assert_eq!(list, samples(&[(100.0, 12)]));
    }

    #[test]
    fn test_twap_two_samples() {
        let (twap, list) = calc_twap(48, &samples(&[(100.0, 12)]), Some(PriceSample::new(110.0, 24)));
        assert_eq!(twap, 100.0);
        assert_eq!(list, samples(&[(100.0, 12), (110.0, 24)]));
    }

    #[test]
    fn test_twap_window_keeps_clamped_boundary() {
        let (twap, list) = calc_twap(48, &default_dataset(), Some(NEW_SAMPLE));
        assert_eq!(twap, 110.0);
        assert_eq!(
            list,
            samples(&[(95.0, 72), (110.0, 84), (120.0, 96), (115.0, 108), (125.0, 120)])
        );
    }

    #[test]
    fn test_twap_window_shorter_than_sample_period() {
        let (twap, list) = calc_twap(6, &default_dataset(), Some(NEW_SAMPLE));
        assert_eq!(twap, 115.0);
        assert_eq!(list, samples(&[(115.0, 114), (125.0, 120)]));
    }

    #[test]
    fn test_twap_unequal_periods() {
        let dataset = samples(&[
            (100.0, 2),
            (110.0, 24),
            (90.0, 28),
            (115.0, 55),
            (105.0, 60),
            (95.0, 61),
            (110.0, 94),
            (120.0, 96),
            (115.0, 100),
        ]);
        let (twap, list) = calc_twap(48, &dataset, Some(NEW_SAMPLE));
        assert_eq!(twap, 106.041666);
        assert_eq!(
            list,
            samples(&[(95.0, 72), (110.0, 94), (120.0, 96), (115.0, 100), (125.0, 120)])
        );
    }

    #[test]
    fn test_twap_passing_through_dataset() {
        let mut dataset = default_dataset();
        dataset.push(NEW_SAMPLE);
        for i in 0..5 {
            dataset.push(PriceSample::new(0.0, 132 + 12 * i));
        }

        let expected = [
            100.0, 100.0, 105.0, 100.0, 103.75, 105.0, 101.25, 106.25, 107.5, 110.0, 117.5, 90.0,
            60.0, 31.25, 0.0,
        ];

        let mut list: Vec<PriceSample> = Vec::new();
        let mut twap_list = Vec::new();
        for sample in dataset {
            let (twap, updated) = calc_twap(48, &list, Some(sample));
            list = updated;
            twap_list.push(twap);
        }

        assert_eq!(twap_list, expected);
    }

    #[test]
    fn test_twap_uniform_series_is_value() {
        for window in [1, 12, 30, 48, 1000] {
            let mut list: Vec<PriceSample> = Vec::new();
            let mut twap = 0.0;
            for i in 0..20 {
                let (t, updated) = calc_twap(window, &list, Some(PriceSample::new(42.5, 10 + 10 * i)));
                list = updated;
                twap = t;
                assert_eq!(twap, 42.5, "window {window}, step {i}");
            }
            assert_eq!(twap, 42.5);
        }
    }

    #[test]
    fn test_twap_sample_older_than_last() {
        let (twap, list) = calc_twap(
            60,
            &samples(&[(100.0, 100), (110.0, 112)]),
            Some(PriceSample::new(120.0, 110)),
        );
        // intervals 12 and -2 over a period of 10
        assert_eq!(twap, 98.0);
        assert_eq!(list, samples(&[(100.0, 100), (110.0, 112), (120.0, 110)]));
    }

    #[test]
    fn test_twap_empty() {
        let (twap, list) = calc_twap(48, &[], None);
        assert_eq!(twap, 0.0);
        assert!(list.is_empty());
    }

    #[test]
    fn test_ema_seeding() {
        assert_eq!(calc_ema(4.0, 123.45, None), 123.45);
        assert_eq!(calc_ema(0.0, 7.0, None), 7.0);
        assert_eq!(calc_ema(10.0, 99.0, Some(0.0)), 99.0);
    }

    #[test]
    fn test_ema_sequence() {
        let mut values = vec![100.0, 110.0, 90.0, 115.0, 105.0, 95.0, 110.0, 120.0, 115.0, 125.0];
        values.extend(std::iter::repeat(0.0).take(10));

        let expected = [
            100.0, 104.0, 98.4, 105.04, 105.024, 101.0144, 104.608639, 110.765183, 112.459109,
            117.475465, 70.485278, 42.291166, 25.374699, 15.224819, 9.134891, 5.480934, 3.28856,
            1.973135, 1.183881, 0.710328,
        ];

        let mut ema = None;
        for (value, want) in values.iter().zip(expected) {
            let next = calc_ema(4.0, *value, ema);
            // 6-digit truncation may land one unit below the decimal value
            assert!(approx_eq(next, want, 1.5e-6), "got {next}, want {want}");
            ema = Some(next);
        }

        let last = ema.unwrap_or_default();
        assert!(last < 1.0 && last > 0.0);
    }

    #[test]
    fn test_hybrid_average() {
        assert_eq!(calc_hybrid_average(100.0, 200.0, 1.0), 100.0);
        assert_eq!(calc_hybrid_average(100.0, 200.0, 0.0), 200.0);
        assert!(approx_eq(calc_hybrid_average(100.0, 200.0, 0.7), 130.0, 1e-9));
    }
}
