//! Time-indexed numeric series and inner-join alignment.
//!
//! A [`TimeSeries`] keeps its points sorted by key with unique keys. `NaN` values mark
//! missing observations; they are kept in the series and dropped by [`align`].
//!
//! Serialized as a plain `[[key, value], ...]` array. Deserialization goes through
//! [`TimeSeries::new`], so unsorted input is sorted and duplicate keys are rejected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TailRiskError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<(K, f64)>",
    into = "Vec<(K, f64)>",
    bound(serialize = "K: Clone + Serialize", deserialize = "K: Ord + Deserialize<'de>")
)]
pub struct TimeSeries<K> {
    points: Vec<(K, f64)>,
}

/// Daily series keyed by calendar date.
pub type DailySeries = TimeSeries<NaiveDate>;

impl<K: Ord> TimeSeries<K> {
    /// Builds a series from unordered points, rejecting duplicate keys.
    pub fn new(mut points: Vec<(K, f64)>) -> Result<Self> {
        points.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(i) = points.windows(2).position(|w| w[0].0 == w[1].0) {
            return Err(TailRiskError::InvalidInput(format!(
                "duplicate index key at sorted position {}",
                i + 1
            )));
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<f64> {
        self.points
            .binary_search_by(|(k, _)| k.cmp(key))
            .ok()
            .map(|i| self.points[i].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.points.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.points.iter().map(|(k, v)| (k, *v))
    }

    pub fn into_points(self) -> Vec<(K, f64)> {
        self.points
    }
}

impl<K: Ord> TryFrom<Vec<(K, f64)>> for TimeSeries<K> {
    type Error = TailRiskError;

    fn try_from(points: Vec<(K, f64)>) -> Result<Self> {
        Self::new(points)
    }
}

impl<K> From<TimeSeries<K>> for Vec<(K, f64)> {
    fn from(series: TimeSeries<K>) -> Self {
        series.points
    }
}

impl TimeSeries<usize> {
    /// Positional series: the key of each value is its offset.
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            points: values.iter().copied().enumerate().collect(),
        }
    }
}

/// Two series restricted to their shared, non-missing observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Aligned<K> {
    pub index: Vec<K>,
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

impl<K> Aligned<K> {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Inner-joins two series on their keys, dropping pairs where either side is `NaN`.
pub fn align<K: Ord + Clone>(left: &TimeSeries<K>, right: &TimeSeries<K>) -> Aligned<K> {
    let cap = left.len().min(right.len());
    let mut out = Aligned {
        index: Vec::with_capacity(cap),
        left: Vec::with_capacity(cap),
        right: Vec::with_capacity(cap),
    };

    let (mut i, mut j) = (0usize, 0usize);
    while i < left.points.len() && j < right.points.len() {
        let (lk, lv) = &left.points[i];
        let (rk, rv) = &right.points[j];
        match lk.cmp(rk) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                if !lv.is_nan() && !rv.is_nan() {
                    out.index.push(lk.clone());
                    out.left.push(*lv);
                    out.right.push(*rv);
                }
                i += 1;
                j += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn construction_sorts_and_rejects_duplicates() {
        let s = TimeSeries::new(vec![(day(3), 0.3), (day(1), 0.1)]).unwrap();
        assert_eq!(s.keys().cloned().collect::<Vec<_>>(), vec![day(1), day(3)]);
        assert_eq!(s.get(&day(3)), Some(0.3));
        assert_eq!(s.get(&day(2)), None);

        assert!(TimeSeries::new(vec![(day(1), 0.1), (day(1), 0.2)]).is_err());
    }

    #[test]
    fn align_is_an_inner_join_without_missing_values() {
        let returns = TimeSeries::new(vec![
            (day(1), -0.01),
            (day(2), 0.02),
            (day(3), f64::NAN),
            (day(4), -0.03),
            (day(6), 0.01),
        ])
        .unwrap();
        let var = TimeSeries::new(vec![
            (day(2), 0.02),
            (day(3), 0.02),
            (day(4), 0.025),
            (day(5), 0.02),
            (day(6), f64::NAN),
        ])
        .unwrap();

        let a = align(&returns, &var);
        assert_eq!(a.index, vec![day(2), day(4)]);
        assert_eq!(a.left, vec![0.02, -0.03]);
        assert_eq!(a.right, vec![0.02, 0.025]);
    }

    #[test]
    fn positional_series_align_on_offsets() {
        let a = TimeSeries::from_values(&[1.0, 2.0, 3.0]);
        let b = TimeSeries::from_values(&[4.0, 5.0]);
        let joined = align(&a, &b);
        assert_eq!(joined.index, vec![0, 1]);
        assert_eq!(joined.len(), 2);
    }

    #[test]
    fn deserialized_series_is_sorted_and_unique() {
        let s: TimeSeries<usize> = serde_json::from_str("[[2, 0.3], [0, 0.1]]").unwrap();
        assert_eq!(s.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(s.get(&2), Some(0.3));

        let joined = align(&s, &TimeSeries::from_values(&[1.0, 2.0, 3.0]));
        assert_eq!(joined.index, vec![0, 2]);
        assert_eq!(joined.left, vec![0.1, 0.3]);

        let dup = serde_json::from_str::<TimeSeries<usize>>("[[2, 0.3], [0, 0.1], [0, 0.5]]");
        assert!(dup.unwrap_err().to_string().contains("duplicate index key"));
    }

    #[test]
    fn daily_series_round_trips_as_pairs() {
        let s = TimeSeries::new(vec![(day(4), -0.02), (day(1), 0.01)]).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"[["2024-03-01",0.01],["2024-03-04",-0.02]]"#);
        assert_eq!(serde_json::from_str::<DailySeries>(&json).unwrap(), s);
    }
}
