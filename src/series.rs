use serde::{Deserialize, Serialize};

/// One pixel column of the 24 hour window.
///
/// Fractions are in `[0, 1]`. The feed reports them with 0 at the bottom of
/// the chart; [`Series::to_screen_space`] flips them so 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileRecord {
    #[serde(rename = "i")]
    pub index: u32,
    #[serde(rename = "a")]
    pub average: f64,
    #[serde(rename = "t")]
    pub top: f64,
    pub q1: f64,
    pub q3: f64,
    #[serde(rename = "b")]
    pub bottom: f64,
}

impl QuantileRecord {
    pub fn flipped(&self) -> Self {
        Self {
            index: self.index,
            average: 1.0 - self.average,
            top: 1.0 - self.top,
            q1: 1.0 - self.q1,
            q3: 1.0 - self.q3,
            bottom: 1.0 - self.bottom,
        }
    }

    /// Height of the whole band, `bottom - top`. Negative when inverted.
    pub fn span(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Records in source order. Replaced wholesale on every poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series {
    records: Vec<QuantileRecord>,
}

impl Series {
    pub fn new(records: Vec<QuantileRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[QuantileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuantileRecord> {
        self.records.iter()
    }

    /// Record whose `index` is `column`. Last one wins if the feed repeats an index.
    pub fn get(&self, column: u32) -> Option<&QuantileRecord> {
        self.records.iter().rev().find(|r| r.index == column)
    }

    pub fn to_screen_space(&self) -> Series {
        Series::new(self.records.iter().map(QuantileRecord::flipped).collect())
    }

    /// Largest `index + 1`, i.e. the number of columns the series spans.
    pub fn column_span(&self) -> u32 {
        self.records
            .iter()
            .map(|r| r.index.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// `min(100, round(a * 10000) / 100)` of the newest record, in feed space.
    pub fn latest_average_percentage(&self) -> Option<f64> {
        self.records.last().map(|r| average_percentage(r.average))
    }
}

/// Two-decimal percentage used by the readouts, capped at 100.
pub fn average_percentage(average: f64) -> f64 {
    ((average * 10_000.0 + 0.5).floor() / 100.0).min(100.0)
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a QuantileRecord;
    type IntoIter = std::slice::Iter<'a, QuantileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
