use crate::types::{Normalised, Reading};

/// Observed bounds of the non-null readings in a comparison set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingRange {
    min: f64,
    max: f64,
}

impl ReadingRange {
    /// Bounds over all non-null readings, or `None` when there are none.
    pub fn of<T: Reading>(samples: &[T]) -> Option<Self> {
        samples
            .iter()
            .filter_map(Reading::reading)
            .fold(None, |range, reading| match range {
                None => Some(ReadingRange {
                    min: reading,
                    max: reading,
                }),
                Some(ReadingRange { min, max }) => Some(ReadingRange {
                    min: min.min(reading),
                    max: max.max(reading),
                }),
            })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Rescales a reading against these bounds.
    ///
    /// A flat range (every reading identical) maps to `0` rather than
    /// dividing by zero. Results are clamped to `[0, 1]`.
    pub fn normalise(&self, reading: Option<f64>) -> Option<f64> {
        let reading = reading?;
        let span = self.max - self.min;
        if span == 0.0 {
            return Some(0.0);
        }
        let scaled = if span.is_finite() {
            (reading - self.min) / span
        } else {
            // Bounds further apart than f64::MAX; halve both sides first.
            (reading / 2.0 - self.min / 2.0) / (self.max / 2.0 - self.min / 2.0)
        };
        Some(scaled.clamp(0.0, 1.0))
    }
}

/// Annotates every sample with its reading rescaled to `[0, 1]` relative to
/// the min and max of the whole collection. Order is preserved and null
/// readings stay null.
pub fn apply_range<T: Reading>(samples: Vec<T>) -> Vec<Normalised<T>> {
    let range = ReadingRange::of(&samples);
    tracing::debug!(
        samples = samples.len(),
        min = range.map(|r| r.min),
        max = range.map(|r| r.max),
        "normalising readings"
    );

    samples
        .into_iter()
        .map(|entity| {
            let reading_normalised = range.and_then(|r| r.normalise(entity.reading()));
            Normalised {
                entity,
                reading_normalised,
            }
        })
        .collect()
}
