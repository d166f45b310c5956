//! Z-score feature scaling.

use super::ClusterError;

/// Per-feature standardisation to zero mean and unit variance.
///
/// Uses the population standard deviation. A constant feature keeps a scale
/// of 1 so it maps to 0 rather than dividing by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler<const D: usize> {
    pub mean: [f64; D],
    pub scale: [f64; D],
}

impl<const D: usize> StandardScaler<D> {
    pub fn fit(data: &[[f64; D]]) -> Result<Self, ClusterError> {
        if data.is_empty() {
            return Err(ClusterError::EmptyInput);
        }
        let n = data.len() as f64;

        let mut mean = [0.0; D];
        for row in data {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = [0.0; D];
        for row in data {
            for f in 0..D {
                let d = row[f] - mean[f];
                var[f] += d * d;
            }
        }

        let scale = std::array::from_fn(|f| {
            let sd = (var[f] / n).sqrt();
            if sd > f64::EPSILON * mean[f].abs().max(1.0) {
                sd
            } else {
                1.0
            }
        });

        Ok(Self { mean, scale })
    }

    pub fn transform(&self, data: &[[f64; D]]) -> Vec<[f64; D]> {
        data.iter()
            .map(|row| std::array::from_fn(|f| (row[f] - self.mean[f]) / self.scale[f]))
            .collect()
    }

    pub fn fit_transform(data: &[[f64; D]]) -> Result<(Self, Vec<[f64; D]>), ClusterError> {
        let scaler = Self::fit(data)?;
        let scaled = scaler.transform(data);
        Ok((scaler, scaled))
    }

    /// Map scaled points back to original feature units.
    pub fn inverse_transform(&self, data: &[[f64; D]]) -> Vec<[f64; D]> {
        data.iter()
            .map(|row| std::array::from_fn(|f| row[f] * self.scale[f] + self.mean[f]))
            .collect()
    }
}
