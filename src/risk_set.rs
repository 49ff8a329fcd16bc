use log::{debug, warn};
use ndarray::{Array1, ArrayView1};
use std::fmt;

use crate::{
    data::SurvivalData,
    deviance::{CoxDevianceEvaluator, CoxDevianceResult, EvaluationConfig},
    error::Result,
    ties::{group_ties, TieGroups},
};

/// non-fatal things noticed while building the risk-set tables
#[derive(Debug, Clone, PartialEq)]
pub enum DataWarning {
    /// every observation is censored
    NoEvents,
    /// the event(s) at `time`, tied or not, carry zero total weight
    ZeroWeightEventTime { time: f64 },
    /// strata were supplied but evaluation uses one global risk set
    StrataIgnored { n_strata: usize },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEvents => write!(f, "no events observed; deviance is identically zero"),
            Self::ZeroWeightEventTime { time } => {
                write!(f, "zero-weight event time {time}; it adds nothing to the likelihood")
            }
            Self::StrataIgnored { n_strata } => write!(
                f,
                "{n_strata} strata supplied but the risk set is global; strata are ignored"
            ),
        }
    }
}

/// Sorted, tie-aggregated layout of right-censored data (Breslow ties).
///
/// Built once per dataset and read-only afterwards. Everything indexed by
/// "position" is in sorted order: time ascending, events before censorings
/// at equal times.
#[derive(Debug, Clone)]
pub struct TiedRiskPreprocessor {
    order: Vec<usize>,             // sorted position -> original index
    event_time: Array1<f64>,       // sorted
    status: Array1<f64>,           // sorted, 1.0 = event
    sample_weight: Array1<f64>,    // sorted
    derived_weight: Array1<f64>,   // tie mass moved onto the first event of each time
    derived_event: Vec<bool>,      // one aggregated event per distinct event time
    risk_count: Vec<usize>,        // running count of derived events
    ties: TieGroups,               // over sorted positions of event rows
    loglik_sat: f64,
    n_strata: usize,
    warnings: Vec<DataWarning>,
}

impl TiedRiskPreprocessor {
    pub fn new(data: &SurvivalData) -> Result<Self> {
        let n = data.n_samples();
        let times = data.event_time();
        let raw_status = data.status();
        let weights = data.sample_weight();

        // single stable sort on (time asc, status desc)
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            times[a]
                .total_cmp(&times[b])
                .then_with(|| raw_status[b].cmp(&raw_status[a]))
        });

        let event_time: Array1<f64> = order.iter().map(|&i| times[i]).collect();
        let status: Array1<f64> = order
            .iter()
            .map(|&i| if raw_status[i] { 1.0 } else { 0.0 })
            .collect();
        let sample_weight: Array1<f64> = order.iter().map(|&i| weights[i]).collect();

        let event_positions: Vec<usize> = (0..n).filter(|&i| status[i] > 0.0).collect();
        let event_times: Vec<f64> = event_positions.iter().map(|&i| event_time[i]).collect();
        let ties = group_ties(&event_times, &event_positions);

        let mut derived_weight = sample_weight.clone();
        let mut derived_event: Vec<bool> = status.iter().map(|&d| d > 0.0).collect();
        for group in &ties.groups {
            let total: f64 = group.positions.iter().map(|&p| sample_weight[p]).sum();
            derived_weight[group.positions[0]] = total;
            for &p in &group.positions[1..] {
                derived_weight[p] = 0.0;
                derived_event[p] = false;
            }
        }

        let mut warnings = Vec::new();
        if event_positions.is_empty() {
            warnings.push(DataWarning::NoEvents);
        }

        // saturated model: every distinct event time fitted perfectly
        let mut loglik_sat = 0.0;
        for &first in &ties.first_positions {
            let w = derived_weight[first];
            if w > 0.0 {
                loglik_sat -= w * w.ln();
            } else {
                warnings.push(DataWarning::ZeroWeightEventTime { time: event_time[first] });
            }
        }

        let mut risk_count = Vec::with_capacity(n);
        let mut running = 0;
        for &d in &derived_event {
            if d {
                running += 1;
            }
            risk_count.push(running);
        }

        let n_strata = data.n_strata();
        if n_strata > 1 {
            warnings.push(DataWarning::StrataIgnored { n_strata });
        }

        for warning in &warnings {
            warn!("{warning}");
        }
        debug!(
            "risk-set tables: {} observations, {} events, {} distinct event times, {} tie groups",
            n,
            event_positions.len(),
            ties.n_distinct(),
            ties.groups.len()
        );

        Ok(Self {
            order,
            event_time,
            status,
            sample_weight,
            derived_weight,
            derived_event,
            risk_count,
            ties,
            loglik_sat,
            n_strata,
            warnings,
        })
    }

    /// how many observations
    pub fn n_samples(&self) -> usize {
        self.order.len()
    }

    /// number of distinct event times, i.e. aggregated events
    pub fn n_event_times(&self) -> usize {
        self.ties.n_distinct()
    }

    /// sorted position -> original observation index
    pub fn sorted_index(&self) -> &[usize] {
        &self.order
    }

    /// event times in sorted order
    pub fn sorted_event_time(&self) -> ArrayView1<'_, f64> {
        self.event_time.view()
    }

    /// event indicator (1.0 / 0.0) in sorted order
    pub fn sorted_status(&self) -> ArrayView1<'_, f64> {
        self.status.view()
    }

    /// raw weights in sorted order
    pub fn sorted_sample_weight(&self) -> ArrayView1<'_, f64> {
        self.sample_weight.view()
    }

    pub fn derived_weight(&self) -> ArrayView1<'_, f64> {
        self.derived_weight.view()
    }

    pub fn derived_event(&self) -> &[bool] {
        &self.derived_event
    }

    pub fn risk_count(&self) -> &[usize] {
        &self.risk_count
    }

    pub fn tie_groups(&self) -> &TieGroups {
        &self.ties
    }

    pub fn saturated_log_likelihood(&self) -> f64 {
        self.loglik_sat
    }

    /// distinct strata seen at construction (not used by evaluation)
    pub fn n_strata(&self) -> usize {
        self.n_strata
    }

    pub fn warnings(&self) -> &[DataWarning] {
        &self.warnings
    }

    /// deviance, gradient and diagonal Hessian with the default config
    pub fn deviance(&self, linear_predictor: ArrayView1<f64>) -> Result<CoxDevianceResult> {
        CoxDevianceEvaluator::new(EvaluationConfig::default()).evaluate(self, linear_predictor)
    }
}
