use crate::record::FeatureRecord;

/// What to order the records by, always ascending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
pub enum SortKey {
    /// Standard deviation of the hue histogram
    HueSpread,
    /// Standard deviation of the saturation histogram
    SaturationSpread,
    /// Standard deviation of the areas enclosed by the edges
    ContourAreaSpread,
}

impl SortKey {
    pub fn value(self, record: &FeatureRecord) -> f64 {
        match self {
            Self::HueSpread => record.hue().std,
            Self::SaturationSpread => record.saturation().std,
            Self::ContourAreaSpread => record.contours().area_std,
        }
    }
}

/// The records in ranked order. Borrows from whatever holds the records.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RankedView<'a> {
    pub key: SortKey,
    pub records: Vec<&'a FeatureRecord>,
}

impl<'a> RankedView<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a FeatureRecord> + '_ {
        self.records.iter().copied()
    }
}

/// Stable, so equal values keep their order in `records`. NaN sorts last.
pub fn rank(records: &[FeatureRecord], key: SortKey) -> RankedView<'_> {
    let mut ranked: Vec<&FeatureRecord> = records.iter().collect();
    ranked.sort_by(|a, b| key.value(a).total_cmp(&key.value(b)));
    RankedView {
        key,
        records: ranked,
    }
}
