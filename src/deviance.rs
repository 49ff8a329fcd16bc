use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;

use crate::{
    error::{CoxError, Result},
    risk_set::TiedRiskPreprocessor,
};

/// Which derivatives to compute per evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationConfig {
    pub gradient: bool,
    pub hessian: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            gradient: true,
            hessian: true,
        }
    }
}

impl EvaluationConfig {
    pub fn without_gradient(mut self) -> Self {
        self.gradient = false;
        self
    }

    pub fn without_hessian(mut self) -> Self {
        self.hessian = false;
        self
    }

    /// skip both derivative passes
    pub fn deviance_only() -> Self {
        Self {
            gradient: false,
            hessian: false,
        }
    }
}

/// Output of one evaluation. Vectors are in the caller's original order.
///
/// `gradient` and `diag_hessian` are twice the first and second derivatives
/// of the partial log-likelihood, so they point uphill in likelihood and
/// downhill in deviance.
#[derive(Debug, Clone, PartialEq)]
pub struct CoxDevianceResult {
    pub deviance: f64,
    pub log_likelihood: f64,
    pub gradient: Option<Array1<f64>>,
    pub diag_hessian: Option<Array1<f64>>,
}

/// Breslow-tied Cox deviance over a [`TiedRiskPreprocessor`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CoxDevianceEvaluator {
    config: EvaluationConfig,
}

impl CoxDevianceEvaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> EvaluationConfig {
        self.config
    }

    /// Deviance (and requested derivatives) for one linear predictor.
    ///
    /// NaN or infinite entries are not rejected; they propagate into the
    /// outputs.
    pub fn evaluate(
        &self,
        pre: &TiedRiskPreprocessor,
        linear_predictor: ArrayView1<f64>,
    ) -> Result<CoxDevianceResult> {
        let n = pre.n_samples();
        if linear_predictor.len() != n {
            return Err(CoxError::dimension_mismatch(n, linear_predictor.len()));
        }

        let order = pre.sorted_index();
        let w = pre.sorted_sample_weight();
        let d = pre.sorted_status();
        let derived_w = pre.derived_weight();
        let derived_d = pre.derived_event();
        let risk_count = pre.risk_count();

        // centre before exponentiating; the partial likelihood is shift invariant
        let mut eta: Array1<f64> = order.iter().map(|&i| linear_predictor[i]).collect();
        let mean = eta.sum() / n as f64;
        eta -= mean;
        let exp_eta = eta.mapv(f64::exp);
        let w_exp_eta = &w * &exp_eta;

        // weighted risk remaining at or after each sorted position
        let mut risk_den = Array1::zeros(n);
        let mut acc = 0.0;
        for i in (0..n).rev() {
            acc += w_exp_eta[i];
            risk_den[i] = acc;
        }

        let event_term: f64 = (0..n).filter(|&i| d[i] > 0.0).map(|i| w[i] * eta[i]).sum();
        let log_terms: f64 = (0..n)
            .filter(|&i| derived_d[i] && derived_w[i] > 0.0)
            .map(|i| derived_w[i] * risk_den[i].ln())
            .sum();
        let log_likelihood = event_term - log_terms;
        let deviance = 2.0 * (pre.saturated_log_likelihood() - log_likelihood);

        let mut gradient = None;
        let mut diag_hessian = None;

        if self.config.gradient || self.config.hessian {
            // cumulative tables indexed by risk count; slot 0 is "no events yet"
            let n_groups = pre.n_event_times();
            let mut inv = Vec::with_capacity(n_groups + 1);
            let mut inv2 = Vec::with_capacity(n_groups + 1);
            inv.push(0.0);
            inv2.push(0.0);
            let (mut s1, mut s2) = (0.0, 0.0);
            for i in (0..n).filter(|&i| derived_d[i]) {
                if derived_w[i] > 0.0 {
                    s1 += derived_w[i] / risk_den[i];
                    s2 += derived_w[i] / (risk_den[i] * risk_den[i]);
                }
                inv.push(s1);
                inv2.push(s2);
            }

            if self.config.gradient {
                let mut grad = Array1::zeros(n);
                for i in 0..n {
                    let g = w[i] * (d[i] - exp_eta[i] * inv[risk_count[i]]);
                    grad[order[i]] = 2.0 * g;
                }
                gradient = Some(grad);
            }

            if self.config.hessian {
                let mut hess = Array1::zeros(n);
                for i in 0..n {
                    let we = w_exp_eta[i];
                    let k = risk_count[i];
                    hess[order[i]] = 2.0 * (we * we * inv2[k] - we * inv[k]);
                }
                diag_hessian = Some(hess);
            }
        }

        debug!("cox deviance {deviance:.6} (loglik {log_likelihood:.6}) over {n} observations");

        Ok(CoxDevianceResult {
            deviance,
            log_likelihood,
            gradient,
            diag_hessian,
        })
    }

    /// Evaluate every row of `candidates` as its own linear predictor, in parallel.
    pub fn evaluate_batch(
        &self,
        pre: &TiedRiskPreprocessor,
        candidates: ArrayView2<f64>,
    ) -> Result<Vec<CoxDevianceResult>> {
        if candidates.ncols() != pre.n_samples() {
            return Err(CoxError::dimension_mismatch(pre.n_samples(), candidates.ncols()));
        }

        candidates
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| self.evaluate(pre, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SurvivalData;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    fn scenario() -> TiedRiskPreprocessor {
        let times = vec![2.0, 4.0, 3.0, 5.0, 6.5, 7.0, 7.0, 7.0, 7.0];
        let codes = vec![0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 7.0, 7.0, 7.0];
        let data = SurvivalData::from_status_codes(times, codes).unwrap();
        TiedRiskPreprocessor::new(&data).unwrap()
    }

    #[test]
    fn test_scenario_deviance() {
        let pre = scenario();
        let result = pre.deviance(Array1::<f64>::ones(9).view()).unwrap();

        // risk sets at t = 3, 4, 7 hold 8, 7 and 4 unit scores
        assert_relative_eq!(result.deviance, 2.0 * 56.0f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(
            result.log_likelihood,
            -(8.0f64.ln() + 7.0f64.ln() + 4.0 * 4.0f64.ln()),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_scenario_gradient() {
        let pre = scenario();
        let grad = pre.deviance(Array1::<f64>::ones(9).view()).unwrap().gradient.unwrap();

        let tail = -30.0 / 56.0;
        let expected = [0.0, 82.0 / 56.0, 1.75, tail, tail, tail, tail, tail, tail];
        for (g, e) in grad.iter().zip(expected.iter()) {
            assert_relative_eq!(*g, *e, epsilon = 1e-12);
        }
        assert_relative_eq!(grad.sum(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scenario_hessian() {
        let pre = scenario();
        let hess = pre.deviance(Array1::<f64>::ones(9).view()).unwrap().diag_hessian.unwrap();

        let inv = [0.0, 1.0 / 8.0, 1.0 / 8.0 + 1.0 / 7.0, 1.0 / 8.0 + 1.0 / 7.0 + 1.0];
        let inv2 = [
            0.0,
            1.0 / 64.0,
            1.0 / 64.0 + 1.0 / 49.0,
            1.0 / 64.0 + 1.0 / 49.0 + 4.0 / 16.0,
        ];
        let h = |k: usize| 2.0 * (inv2[k] - inv[k]);

        assert_relative_eq!(hess[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(hess[2], h(1), epsilon = 1e-12);
        assert_relative_eq!(hess[1], h(2), epsilon = 1e-12);
        assert_relative_eq!(hess[3], h(2), epsilon = 1e-12);
        // censored at 6.5, still at risk for the t = 3 and t = 4 events only
        assert_relative_eq!(hess[4], h(2), epsilon = 1e-12);
        // the tie at t = 7 puts weight 4 on a denominator of 4
        for i in 5..9 {
            assert_relative_eq!(hess[i], h(3), epsilon = 1e-12);
        }
        assert!(hess.iter().all(|&x| x <= 0.0));
    }

    #[test]
    fn test_repeatable_bit_for_bit() {
        let pre = scenario();
        let eta = Array1::<f64>::ones(9);
        let a = pre.deviance(eta.view()).unwrap();
        let b = pre.deviance(eta.view()).unwrap();

        assert_eq!(a.deviance.to_bits(), b.deviance.to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn test_optional_outputs() {
        let pre = scenario();
        let eta = Array1::<f64>::zeros(9);

        let evaluator = CoxDevianceEvaluator::new(EvaluationConfig::deviance_only());
        assert_eq!(evaluator.config(), EvaluationConfig::deviance_only());
        let only_dev = evaluator.evaluate(&pre, eta.view()).unwrap();
        assert!(only_dev.gradient.is_none());
        assert!(only_dev.diag_hessian.is_none());

        let grad_only = CoxDevianceEvaluator::new(EvaluationConfig::default().without_hessian())
            .evaluate(&pre, eta.view())
            .unwrap();
        assert!(grad_only.gradient.is_some());
        assert!(grad_only.diag_hessian.is_none());

        let hess_only = CoxDevianceEvaluator::new(EvaluationConfig::default().without_gradient())
            .evaluate(&pre, eta.view())
            .unwrap();
        assert!(hess_only.gradient.is_none());
        assert!(hess_only.diag_hessian.is_some());

        assert_eq!(CoxDevianceEvaluator::default().config(), EvaluationConfig::default());

        assert_relative_eq!(only_dev.deviance, hess_only.deviance, epsilon = 1e-14);
    }

    #[test]
    fn test_dimension_mismatch() {
        let pre = scenario();
        let err = pre.deviance(Array1::<f64>::zeros(4).view()).unwrap_err();
        assert_eq!(err, CoxError::DimensionMismatch { expected: 9, got: 4 });

        // the tables are untouched and the next call works
        assert!(pre.deviance(Array1::<f64>::zeros(9).view()).is_ok());
    }

    #[test]
    fn test_nan_propagates() {
        let pre = scenario();
        let mut eta = Array1::<f64>::zeros(9);
        eta[3] = f64::NAN;

        let result = pre.deviance(eta.view()).unwrap();
        assert!(result.deviance.is_nan());
        assert!(result.gradient.unwrap().iter().any(|g| g.is_nan()));
    }

    #[test]
    fn test_all_censored() {
        let data = SurvivalData::new(vec![1.0, 2.0, 3.0], vec![false; 3]).unwrap();
        let pre = TiedRiskPreprocessor::new(&data).unwrap();
        let result = pre.deviance(array![0.3, -1.0, 2.0].view()).unwrap();

        assert_eq!(result.deviance, 0.0);
        assert!(result.gradient.unwrap().iter().all(|&g| g == 0.0));
        assert!(result.diag_hessian.unwrap().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_zero_weight_group_is_finite() {
        let data = SurvivalData::new(vec![1.0, 1.0, 2.0, 3.0], vec![true, true, true, false])
            .unwrap()
            .with_sample_weight(vec![0.0, 0.0, 1.0, 1.0])
            .unwrap();
        let pre = TiedRiskPreprocessor::new(&data).unwrap();
        let result = pre.deviance(array![0.5, 0.1, -0.2, 0.4].view()).unwrap();

        assert!(result.deviance.is_finite());
        let grad = result.gradient.unwrap();
        assert!(grad.iter().all(|g| g.is_finite()));
        // zero-weight rows contribute nothing
        assert_eq!(grad[0], 0.0);
        assert_eq!(grad[1], 0.0);
    }

    #[test]
    fn test_single_observation() {
        let data = SurvivalData::new(vec![1.0], vec![true]).unwrap();
        let pre = TiedRiskPreprocessor::new(&data).unwrap();
        let result = pre.deviance(array![3.7].view()).unwrap();

        assert_relative_eq!(result.deviance, 0.0, epsilon = 1e-14);
        assert_relative_eq!(result.gradient.unwrap()[0], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let pre = scenario();
        let evaluator = CoxDevianceEvaluator::default();
        let candidates = Array2::from_shape_fn((4, 9), |(r, c)| 0.1 * (r as f64) * (c as f64));

        let batch = evaluator.evaluate_batch(&pre, candidates.view()).unwrap();
        assert_eq!(batch.len(), 4);
        for (row, result) in candidates.outer_iter().zip(batch.iter()) {
            let single = evaluator.evaluate(&pre, row).unwrap();
            assert_eq!(&single, result);
        }

        let wrong = Array2::<f64>::zeros((2, 5));
        assert!(evaluator.evaluate_batch(&pre, wrong.view()).is_err());
    }
}
