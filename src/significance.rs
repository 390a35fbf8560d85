//! # Significance Engine
//!
//! Compares metric distributions between two behavioral states, per band.
//!
//! - **Global metrics** are compared with a paired t-test over subjects
//!   recorded in both states. Subjects whose value is not a finite number
//!   in either state (undefined, error marker, `+inf`) are excluded.
//! - **Node metrics** are compared with a two-sample KS test over node
//!   values pooled across all subjects of each state.
//!
//! The engine only reads the metrics catalog. Run it once every record for
//! the states and bands of interest has been inserted.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::MetricsCatalog;
use crate::metrics::{GlobalMetric, MetricId, NodeMetric};
use crate::model::{Band, CatalogKey, State};
use crate::pipeline::fan_out;
use crate::stats::{self, TestResult};
use crate::{Error, Result};

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    PairedT,
    KolmogorovSmirnov,
}

/// Outcome of one statistical comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub band: Band,
    pub metric: MetricId,
    pub state_1: State,
    pub state_2: State,
    pub test: TestKind,
    #[serde(with = "crate::model::value::float_repr")]
    pub statistic: f64,
    pub p_value: f64,
    pub alpha: f64,
    pub significant: bool,
    /// Paired: matched subjects used. Pooled: values in the first sample.
    pub n_1: usize,
    /// Paired: same as `n_1`. Pooled: values in the second sample.
    pub n_2: usize,
    /// Subjects (paired) or records (pooled) left out for lacking a usable value.
    pub excluded: usize,
}

/// Per-pair result of a full comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    Tested(ComparisonRecord),
    Skipped { reason: String },
}

impl ComparisonOutcome {
    pub fn record(&self) -> Option<&ComparisonRecord> {
        match self {
            ComparisonOutcome::Tested(r) => Some(r),
            ComparisonOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ComparisonOutcome::Skipped { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub band: Band,
    pub metric: MetricId,
    pub outcome: ComparisonOutcome,
}

/// One outcome per `(band, metric)` pair, bands in the requested order and
/// metrics in registry order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub state_1: State,
    pub state_2: State,
    pub alpha: f64,
    pub entries: Vec<ReportEntry>,
}

impl ComparisonReport {
    pub fn get(&self, band: Band, metric: MetricId) -> Option<&ComparisonOutcome> {
        self.entries
            .iter()
            .find(|e| e.band == band && e.metric == metric)
            .map(|e| &e.outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = ((Band, MetricId), &ComparisonOutcome)> {
        self.entries.iter().map(|e| ((e.band, e.metric), &e.outcome))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn tested_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.outcome.is_skipped()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_skipped()).count()
    }

    /// Tested pairs whose p-value fell below alpha.
    pub fn significant(&self) -> impl Iterator<Item = &ComparisonRecord> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.record())
            .filter(|r| r.significant)
    }
}

// ============================================================================
// SignificanceEngine
// ============================================================================

pub struct SignificanceEngine<'a> {
    metrics: &'a MetricsCatalog,
}

impl<'a> SignificanceEngine<'a> {
    pub fn new(metrics: &'a MetricsCatalog) -> Self {
        Self { metrics }
    }

    /// Paired t-test of a global metric between two states in one band.
    pub fn compare_global(
        &self,
        metric: GlobalMetric,
        state_1: State,
        state_2: State,
        band: Band,
        alpha: f64,
    ) -> Result<ComparisonRecord> {
        check_alpha(alpha)?;

        let mut first = Vec::new();
        let mut second = Vec::new();
        let mut excluded = 0;

        for key in self.metrics.keys_for(state_1, band) {
            let partner = CatalogKey::new(key.subject.clone(), state_2, band);
            if !self.metrics.contains(&partner) {
                continue;
            }
            let value_of = |k: &CatalogKey| {
                self.metrics
                    .with(k, |r| r.global_value(metric).and_then(|v| v.as_finite()))
            };
            match (value_of(&key)?, value_of(&partner)?) {
                (Some(a), Some(b)) => {
                    first.push(a);
                    second.push(b);
                }
                _ => {
                    warn!(subject = %key.subject, %band, %metric, "subject excluded: no finite value");
                    excluded += 1;
                }
            }
        }

        if first.len() < 2 {
            return Err(Error::InsufficientData(format!(
                "{metric} in {band}: {} matched subjects with finite values ({excluded} excluded), need 2",
                first.len()
            )));
        }

        let result = stats::paired_t_test(&first, &second)?;
        Ok(self.record(
            band,
            MetricId::Global(metric),
            state_1,
            state_2,
            TestKind::PairedT,
            result,
            alpha,
            (first.len(), second.len()),
            excluded,
        ))
    }

    /// Two-sample KS test of pooled node values between two states in one band.
    pub fn compare_node(
        &self,
        metric: NodeMetric,
        state_1: State,
        state_2: State,
        band: Band,
        alpha: f64,
    ) -> Result<ComparisonRecord> {
        check_alpha(alpha)?;

        let (first, excluded_1) = self.pool(metric, state_1, band)?;
        let (second, excluded_2) = self.pool(metric, state_2, band)?;
        if first.is_empty() || second.is_empty() {
            return Err(Error::InsufficientData(format!(
                "{metric} in {band}: pooled samples have sizes {} ({state_1}) and {} ({state_2})",
                first.len(),
                second.len()
            )));
        }

        let result = stats::ks_two_sample(&first, &second)?;
        Ok(self.record(
            band,
            MetricId::Node(metric),
            state_1,
            state_2,
            TestKind::KolmogorovSmirnov,
            result,
            alpha,
            (first.len(), second.len()),
            excluded_1 + excluded_2,
        ))
    }

    /// Dispatch on the metric namespace.
    pub fn compare(
        &self,
        metric: MetricId,
        state_1: State,
        state_2: State,
        band: Band,
        alpha: f64,
    ) -> Result<ComparisonRecord> {
        match metric {
            MetricId::Global(m) => self.compare_global(m, state_1, state_2, band, alpha),
            MetricId::Node(m) => self.compare_node(m, state_1, state_2, band, alpha),
        }
    }

    /// Every registered metric × every band in `bands`.
    ///
    /// A pair that cannot be tested is reported as `Skipped` with its reason;
    /// it never aborts the other pairs. Only an invalid `alpha` fails the run.
    pub fn compare_all(
        &self,
        state_1: State,
        state_2: State,
        bands: &[Band],
        alpha: f64,
    ) -> Result<ComparisonReport> {
        check_alpha(alpha)?;

        let pairs: Vec<(Band, MetricId)> = bands
            .iter()
            .flat_map(|&band| MetricId::all().map(move |m| (band, m)))
            .collect();

        let entries = fan_out(&pairs, |&(band, metric)| {
            let outcome = match self.compare(metric, state_1, state_2, band, alpha) {
                Ok(record) => ComparisonOutcome::Tested(record),
                Err(e) => {
                    warn!(%band, %metric, error = %e, "comparison skipped");
                    ComparisonOutcome::Skipped { reason: e.to_string() }
                }
            };
            ReportEntry { band, metric, outcome }
        });

        let report = ComparisonReport { state_1, state_2, alpha, entries };
        info!(
            %state_1,
            %state_2,
            pairs = report.len(),
            tested = report.tested_count(),
            skipped = report.skipped_count(),
            "comparison run complete"
        );
        Ok(report)
    }

    /// Node values of every record for `(state, band)`, and how many records
    /// carried an error marker instead.
    fn pool(&self, metric: NodeMetric, state: State, band: Band) -> Result<(Vec<f64>, usize)> {
        let mut pooled = Vec::new();
        let mut excluded = 0;
        for key in self.metrics.keys_for(state, band) {
            self.metrics.with(&key, |record| {
                match record.node_values(metric).and_then(|v| v.values()) {
                    Some(values) => pooled.extend(values.values().copied().filter(|v| v.is_finite())),
                    None => excluded += 1,
                }
            })?;
        }
        Ok((pooled, excluded))
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        band: Band,
        metric: MetricId,
        state_1: State,
        state_2: State,
        test: TestKind,
        result: TestResult,
        alpha: f64,
        (n_1, n_2): (usize, usize),
        excluded: usize,
    ) -> ComparisonRecord {
        ComparisonRecord {
            band,
            metric,
            state_1,
            state_2,
            test,
            statistic: result.statistic,
            p_value: result.p_value,
            alpha,
            significant: result.p_value < alpha,
            n_1,
            n_2,
            excluded,
        }
    }
}

fn check_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!("alpha must be in (0, 1), got {alpha}")))
    }
}
