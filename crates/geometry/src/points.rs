//! Uniform access to point collections.
//!
//! Points arrive in one of three encodings: a flat list of alternating
//! numbers, a list of `[x, y]` pairs, or a list of `{x, y}` records.
//! The encoding is detected from the shape of the data when
//! deserializing, and every consumer reads points through [`Points::get`]
//! so the encoding never leaks further.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A point record, `{x, y}`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct XY {
    pub x: f64,
    pub y: f64,
}

impl From<XY> for DVec2 {
    fn from(p: XY) -> Self {
        DVec2::new(p.x, p.y)
    }
}

impl From<DVec2> for XY {
    fn from(p: DVec2) -> Self {
        XY { x: p.x, y: p.y }
    }
}

/// A point collection in any of the accepted encodings.
///
/// Serializes back in the encoding it was created with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Points {
    /// `[x0, y0, x1, y1, ...]`; a trailing odd number is ignored.
    Flat(Vec<f64>),
    /// `[[x0, y0], [x1, y1], ...]`
    Pairs(Vec<[f64; 2]>),
    /// `[{x: x0, y: y0}, ...]`
    Records(Vec<XY>),
}

impl Default for Points {
    fn default() -> Self {
        Points::Pairs(Vec::new())
    }
}

impl Points {
    pub fn len(&self) -> usize {
        match self {
            Points::Flat(values) => values.len() / 2,
            Points::Pairs(pairs) => pairs.len(),
            Points::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `i`th point, regardless of encoding.
    pub fn get(&self, i: usize) -> Option<DVec2> {
        if i >= self.len() {
            return None;
        }
        Some(match self {
            Points::Flat(values) => DVec2::new(values[2 * i], values[2 * i + 1]),
            Points::Pairs(pairs) => DVec2::new(pairs[i][0], pairs[i][1]),
            Points::Records(records) => records[i].into(),
        })
    }

    pub fn first(&self) -> Option<DVec2> {
        self.get(0)
    }

    pub fn last(&self) -> Option<DVec2> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> PointIter<'_> {
        PointIter {
            points: self,
            next: 0,
        }
    }

    pub fn to_vec(&self) -> Vec<DVec2> {
        self.iter().collect()
    }

    /// Moves every point by `delta`, keeping the encoding.
    pub fn translate(&mut self, delta: DVec2) {
        match self {
            Points::Flat(values) => {
                let n = values.len() / 2;
                for i in 0..n {
                    values[2 * i] += delta.x;
                    values[2 * i + 1] += delta.y;
                }
            }
            Points::Pairs(pairs) => {
                for pair in pairs.iter_mut() {
                    pair[0] += delta.x;
                    pair[1] += delta.y;
                }
            }
            Points::Records(records) => {
                for record in records.iter_mut() {
                    record.x += delta.x;
                    record.y += delta.y;
                }
            }
        }
    }
}

impl From<Vec<DVec2>> for Points {
    fn from(points: Vec<DVec2>) -> Self {
        Points::Pairs(points.into_iter().map(|p| [p.x, p.y]).collect())
    }
}

impl From<Vec<[f64; 2]>> for Points {
    fn from(pairs: Vec<[f64; 2]>) -> Self {
        Points::Pairs(pairs)
    }
}

impl From<Vec<f64>> for Points {
    fn from(values: Vec<f64>) -> Self {
        Points::Flat(values)
    }
}

impl From<Vec<XY>> for Points {
    fn from(records: Vec<XY>) -> Self {
        Points::Records(records)
    }
}

pub struct PointIter<'a> {
    points: &'a Points,
    next: usize,
}

impl Iterator for PointIter<'_> {
    type Item = DVec2;

    fn next(&mut self) -> Option<DVec2> {
        let point = self.points.get(self.next)?;
        self.next += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.points.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PointIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn encodings() -> [Points; 3] {
        [
            Points::Flat(vec![0.0, 1.0, 2.0, 3.0, -4.0, 5.5]),
            Points::Pairs(vec![[0.0, 1.0], [2.0, 3.0], [-4.0, 5.5]]),
            Points::Records(vec![
                XY { x: 0.0, y: 1.0 },
                XY { x: 2.0, y: 3.0 },
                XY { x: -4.0, y: 5.5 },
            ]),
        ]
    }

    #[test]
    fn test_encodings_are_equivalent() {
        let [flat, pairs, records] = encodings();
        assert_eq!(flat.len(), 3);
        for i in 0..4 {
            assert_eq!(flat.get(i), pairs.get(i));
            assert_eq!(pairs.get(i), records.get(i));
        }
        assert_eq!(flat.get(3), None);
    }

    #[test]
    fn test_detects_encoding_from_shape() {
        let flat: Points = serde_json::from_str("[1, 2, 3, 4]").unwrap();
        let pairs: Points = serde_json::from_str("[[1, 2], [3, 4]]").unwrap();
        let records: Points = serde_json::from_str(r#"[{"x": 1, "y": 2}, {"x": 3, "y": 4}]"#).unwrap();
        assert!(matches!(flat, Points::Flat(_)));
        assert!(matches!(pairs, Points::Pairs(_)));
        assert!(matches!(records, Points::Records(_)));
        assert_eq!(flat.to_vec(), records.to_vec());
    }

    #[test]
    fn test_odd_flat_ignores_trailing_value() {
        let points = Points::Flat(vec![1.0, 2.0, 3.0]);
        assert_eq!(points.len(), 1);
        assert_eq!(points.iter().len(), 1);
    }

    #[test]
    fn test_translate_keeps_encoding() {
        for mut points in encodings() {
            points.translate(DVec2::new(1.0, -1.0));
            assert_eq!(points.first(), Some(DVec2::new(1.0, 0.0)));
            assert_eq!(points.last(), Some(DVec2::new(-3.0, 4.5)));
        }
    }
}
