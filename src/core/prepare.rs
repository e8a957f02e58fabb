//! Input validation and normalization.
//!
//! Turns raw `(timestamp, value, regressors)` rows into a sorted,
//! deduplicated [`PreparedSeries`]: timestamps are parsed from epoch seconds
//! or text, regressor columns are aligned against the configured names, and
//! the sampling granularity is inferred for the seasonality auto-detection
//! policy. This is a pure transform with no side effects.

use crate::config::{ForecastConfig, Growth};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};

/// A timestamp as supplied by the caller: epoch seconds, text, or an
/// already-parsed instant.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTimestamp {
    /// Unix epoch seconds (UTC).
    Epoch(i64),
    /// Text in RFC 3339, `YYYY-MM-DD HH:MM:SS`, or `YYYY-MM-DD` form.
    Text(String),
    /// An already-parsed UTC instant.
    Instant(DateTime<Utc>),
}

impl From<i64> for RawTimestamp {
    fn from(secs: i64) -> Self {
        Self::Epoch(secs)
    }
}

impl From<&str> for RawTimestamp {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RawTimestamp {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::Instant(instant)
    }
}

/// One raw observation row before preparation.
#[derive(Debug, Clone)]
pub struct RawSample {
    pub timestamp: RawTimestamp,
    pub value: f64,
    /// Named exogenous covariate values for this row.
    pub regressors: HashMap<String, f64>,
    /// Capacity bound for logistic growth.
    pub cap: Option<f64>,
    /// Saturating minimum for logistic growth.
    pub floor: Option<f64>,
}

impl RawSample {
    pub fn new(timestamp: impl Into<RawTimestamp>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
            regressors: HashMap::new(),
            cap: None,
            floor: None,
        }
    }

    pub fn with_regressor(mut self, name: impl Into<String>, value: f64) -> Self {
        self.regressors.insert(name.into(), value);
        self
    }

    pub fn with_cap(mut self, cap: f64) -> Self {
        self.cap = Some(cap);
        self
    }

    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = Some(floor);
        self
    }
}

/// Parse a raw timestamp into a UTC instant.
pub fn parse_timestamp(raw: &RawTimestamp) -> Result<DateTime<Utc>> {
    match raw {
        RawTimestamp::Epoch(secs) => Utc.timestamp_opt(*secs, 0).single().ok_or_else(|| {
            ForecastError::Validation(format!("epoch timestamp {secs} is out of range"))
        }),
        RawTimestamp::Instant(instant) => Ok(*instant),
        RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|n| n.and_utc())
            })
            .or_else(|_| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map(|d| NaiveDateTime::new(d, NaiveTime::MIN).and_utc())
            })
            .map_err(|_| ForecastError::Validation(format!("unparseable timestamp '{text}'"))),
    }
}

/// A validated, sorted, deduplicated training series.
///
/// Immutable once produced; all downstream stages read from it.
#[derive(Debug, Clone)]
pub struct PreparedSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    regressors: BTreeMap<String, Vec<f64>>,
    cap: Option<Vec<f64>>,
    floor: Option<Vec<f64>>,
    granularity: Duration,
}

impl PreparedSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn regressor(&self, name: &str) -> Option<&[f64]> {
        self.regressors.get(name).map(|v| v.as_slice())
    }

    pub fn regressor_names(&self) -> impl Iterator<Item = &str> {
        self.regressors.keys().map(|k| k.as_str())
    }

    pub fn cap(&self) -> Option<&[f64]> {
        self.cap.as_deref()
    }

    pub fn floor(&self) -> Option<&[f64]> {
        self.floor.as_deref()
    }

    /// Modal spacing between consecutive observations.
    pub fn granularity(&self) -> Duration {
        self.granularity
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.timestamps[0]
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.timestamps[self.timestamps.len() - 1]
    }

    /// Length of the training span.
    pub fn span(&self) -> Duration {
        self.end() - self.start()
    }

    /// Restrict the series to observations at or before `cutoff`.
    pub(crate) fn slice_up_to(&self, cutoff: DateTime<Utc>) -> Result<PreparedSeries> {
        let n = self.timestamps.iter().take_while(|ts| **ts <= cutoff).count();
        if n < 2 {
            return Err(ForecastError::Validation(format!(
                "fewer than 2 observations at or before cutoff {cutoff}"
            )));
        }
        Ok(PreparedSeries {
            timestamps: self.timestamps[..n].to_vec(),
            values: self.values[..n].to_vec(),
            regressors: self
                .regressors
                .iter()
                .map(|(k, v)| (k.clone(), v[..n].to_vec()))
                .collect(),
            cap: self.cap.as_ref().map(|c| c[..n].to_vec()),
            floor: self.floor.as_ref().map(|f| f[..n].to_vec()),
            granularity: self.granularity,
        })
    }
}

/// Validate and normalize raw samples into a [`PreparedSeries`].
///
/// Fails with a `Validation` error when fewer than 2 distinct timestamps
/// remain, when a timestamp cannot be parsed, when duplicate timestamps carry
/// conflicting values, when a configured regressor has a missing value, or
/// when logistic growth is requested without a capacity on every row.
/// Duplicate timestamps with identical values are dropped.
pub fn prepare(samples: &[RawSample], config: &ForecastConfig) -> Result<PreparedSeries> {
    if samples.len() < 2 {
        return Err(ForecastError::Validation(format!(
            "need at least 2 observations, got {}",
            samples.len()
        )));
    }

    let mut rows: Vec<(DateTime<Utc>, &RawSample)> = Vec::with_capacity(samples.len());
    for sample in samples {
        let ts = parse_timestamp(&sample.timestamp)?;
        if !sample.value.is_finite() {
            return Err(ForecastError::Validation(format!(
                "non-finite value at {ts}"
            )));
        }
        rows.push((ts, sample));
    }
    rows.sort_by_key(|(ts, _)| *ts);

    // Drop exact duplicates; conflicting values at the same timestamp are an
    // input error, not something to average away.
    let mut deduped: Vec<(DateTime<Utc>, &RawSample)> = Vec::with_capacity(rows.len());
    for (ts, sample) in rows {
        match deduped.last() {
            Some((prev_ts, prev)) if *prev_ts == ts => {
                if prev.value != sample.value {
                    return Err(ForecastError::Validation(format!(
                        "duplicate timestamp {ts} with conflicting values ({} vs {})",
                        prev.value, sample.value
                    )));
                }
            }
            _ => deduped.push((ts, sample)),
        }
    }

    if deduped.len() < 2 {
        return Err(ForecastError::Validation(format!(
            "need at least 2 distinct timestamps, got {}",
            deduped.len()
        )));
    }

    let timestamps: Vec<DateTime<Utc>> = deduped.iter().map(|(ts, _)| *ts).collect();
    let values: Vec<f64> = deduped.iter().map(|(_, s)| s.value).collect();

    let mut regressors = BTreeMap::new();
    for name in config.regressors() {
        let mut column = Vec::with_capacity(deduped.len());
        for (ts, sample) in &deduped {
            match sample.regressors.get(name) {
                Some(v) if v.is_finite() => column.push(*v),
                _ => {
                    return Err(ForecastError::Validation(format!(
                        "regressor '{name}' has a missing value at {ts} in the training data"
                    )))
                }
            }
        }
        regressors.insert(name.clone(), column);
    }

    let floor = if deduped.iter().any(|(_, s)| s.floor.is_some()) {
        let mut column = Vec::with_capacity(deduped.len());
        for (ts, sample) in &deduped {
            match sample.floor {
                Some(f) if f.is_finite() => column.push(f),
                _ => {
                    return Err(ForecastError::Validation(format!(
                        "floor value missing at {ts}; supply a floor on every row or none"
                    )))
                }
            }
        }
        Some(column)
    } else {
        None
    };

    let cap = if config.growth() == Growth::Logistic {
        let mut column = Vec::with_capacity(deduped.len());
        for (i, (ts, sample)) in deduped.iter().enumerate() {
            let row_floor = floor.as_ref().map(|f| f[i]).unwrap_or(0.0);
            match sample.cap {
                Some(c) if c.is_finite() && c > row_floor => column.push(c),
                Some(c) => {
                    return Err(ForecastError::Validation(format!(
                        "capacity {c} at {ts} must be finite and above the floor {row_floor}"
                    )))
                }
                None => {
                    return Err(ForecastError::Validation(format!(
                        "logistic growth requires a capacity value on every row; missing at {ts}"
                    )))
                }
            }
        }
        Some(column)
    } else {
        None
    };

    let granularity = infer_granularity(&timestamps);
    let gaps = timestamps
        .windows(2)
        .filter(|w| w[1] - w[0] > granularity + granularity)
        .count();
    if gaps > 0 {
        tracing::debug!(gaps, "training series has gaps wider than twice the modal spacing");
    }
    tracing::debug!(
        rows = timestamps.len(),
        granularity_secs = granularity.num_seconds(),
        "prepared series"
    );

    Ok(PreparedSeries {
        timestamps,
        values,
        regressors,
        cap,
        floor,
        granularity,
    })
}

/// Modal spacing between consecutive timestamps; ties resolve to the
/// smallest spacing.
fn infer_granularity(timestamps: &[DateTime<Utc>]) -> Duration {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in timestamps.windows(2) {
        let secs = (pair[1] - pair[0]).num_seconds();
        *counts.entry(secs).or_insert(0) += 1;
    }
    let modal = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(secs, _)| *secs)
        .unwrap_or(0);
    Duration::seconds(modal)
}
