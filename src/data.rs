use ndarray::{Array1, ArrayView1};
use crate::error::{CoxError, Result};

/// right-censored observations - times, event flags, weights, strata
#[derive(Debug, Clone)]
pub struct SurvivalData {
    event_time: Array1<f64>,    // time of event or censoring
    status: Array1<bool>,       // true = event, false = censored
    sample_weight: Array1<f64>, // non-negative, defaults to 1
    strata: Vec<usize>,         // carried along, single stratum by default
}

impl SurvivalData {
    /// make new survival data w/ unit weights and one stratum
    pub fn new(
        event_time: Vec<f64>, // survival/censoring times
        status: Vec<bool>,    // true = event occurred, false = censored
    ) -> Result<Self> {
        let n_samples = event_time.len();

        if n_samples == 0 {
            return Err(CoxError::invalid_input("need at least one observation"));
        }

        if status.len() != n_samples {
            return Err(CoxError::invalid_input(format!(
                "event_time len ({}) != status len ({})",
                n_samples,
                status.len()
            )));
        }

        if let Some(i) = event_time.iter().position(|t| !t.is_finite()) {
            return Err(CoxError::invalid_input(format!(
                "event time at index {} is not finite ({})",
                i, event_time[i]
            )));
        }

        // -0.0 and 0.0 must sort and tie the same way
        let event_time: Array1<f64> = event_time
            .into_iter()
            .map(|t| if t == 0.0 { 0.0 } else { t })
            .collect();

        Ok(Self {
            event_time,
            status: Array1::from(status),
            sample_weight: Array1::ones(n_samples),
            strata: vec![0; n_samples],
        })
    }

    /// numeric status codes, anything nonzero counts as an event
    pub fn from_status_codes(event_time: Vec<f64>, codes: Vec<f64>) -> Result<Self> {
        if codes.iter().any(|c| c.is_nan()) {
            return Err(CoxError::invalid_input("status codes must not be NaN"));
        }
        let status = codes.into_iter().map(|c| c != 0.0).collect();
        Self::new(event_time, status)
    }

    /// attach per-observation weights
    pub fn with_sample_weight(mut self, sample_weight: Vec<f64>) -> Result<Self> {
        if sample_weight.len() != self.n_samples() {
            return Err(CoxError::invalid_input(format!(
                "sample_weight len ({}) != n_samples ({})",
                sample_weight.len(),
                self.n_samples()
            )));
        }

        if sample_weight.iter().any(|&w| !w.is_finite() || w < 0.0) {
            return Err(CoxError::invalid_input(
                "sample weights must be finite & non-negative",
            ));
        }

        self.sample_weight = Array1::from(sample_weight);
        Ok(self)
    }

    /// attach stratum labels
    pub fn with_strata(mut self, strata: Vec<usize>) -> Result<Self> {
        if strata.len() != self.n_samples() {
            return Err(CoxError::invalid_input(format!(
                "strata len ({}) != n_samples ({})",
                strata.len(),
                self.n_samples()
            )));
        }

        self.strata = strata;
        Ok(self)
    }

    /// how many observations
    pub fn n_samples(&self) -> usize {
        self.event_time.len()
    }

    pub fn event_time(&self) -> ArrayView1<'_, f64> {
        self.event_time.view()
    }

    pub fn status(&self) -> ArrayView1<'_, bool> {
        self.status.view()
    }

    pub fn sample_weight(&self) -> ArrayView1<'_, f64> {
        self.sample_weight.view()
    }

    pub fn strata(&self) -> &[usize] {
        &self.strata
    }

    /// number of observed events (not tie-aggregated)
    pub fn n_events(&self) -> usize {
        self.status.iter().filter(|&&d| d).count()
    }

    /// number of distinct stratum labels
    pub fn n_strata(&self) -> usize {
        let mut labels = self.strata.clone();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }

    /// grab a subset of observations by indices
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        if indices.iter().any(|&i| i >= self.n_samples()) {
            return Err(CoxError::invalid_input("subset index out of bounds"));
        }

        let event_time = indices.iter().map(|&i| self.event_time[i]).collect();
        let status = indices.iter().map(|&i| self.status[i]).collect();
        let sample_weight = indices.iter().map(|&i| self.sample_weight[i]).collect();
        let strata = indices.iter().map(|&i| self.strata[i]).collect();

        Self::new(event_time, status)?
            .with_sample_weight(sample_weight)?
            .with_strata(strata)
    }
}
