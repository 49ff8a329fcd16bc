use ndarray::{Array1, ArrayView1};
use crate::{
    deviance::{CoxDevianceEvaluator, EvaluationConfig},
    error::{CoxError, Result},
    risk_set::TiedRiskPreprocessor,
};

/// deviance of the empty model (linear predictor = 0)
pub fn null_deviance(pre: &TiedRiskPreprocessor) -> Result<f64> {
    let zeros = Array1::<f64>::zeros(pre.n_samples());
    let result = CoxDevianceEvaluator::new(EvaluationConfig::deviance_only())
        .evaluate(pre, zeros.view())?;
    Ok(result.deviance)
}

/// fraction of null deviance explained: 1 - dev / null_dev
pub fn deviance_ratio(deviance: f64, null_deviance: f64) -> Result<f64> {
    if !null_deviance.is_finite() || null_deviance <= 0.0 {
        return Err(CoxError::numerical_error(format!(
            "null deviance must be positive & finite, got {}",
            null_deviance
        )));
    }

    Ok(1.0 - deviance / null_deviance)
}

/// deviance bookkeeping for one path step
#[derive(Debug, Clone)]
pub struct DevianceSummary {
    pub deviance: f64,
    pub null_deviance: f64,
    pub deviance_ratio: f64,
    pub log_likelihood: f64,
    pub saturated_log_likelihood: f64,
}

impl DevianceSummary {
    pub fn compute(pre: &TiedRiskPreprocessor, linear_predictor: ArrayView1<f64>) -> Result<Self> {
        let result = CoxDevianceEvaluator::new(EvaluationConfig::deviance_only())
            .evaluate(pre, linear_predictor)?;
        let null_deviance = null_deviance(pre)?;
        let ratio = deviance_ratio(result.deviance, null_deviance)?;

        Ok(Self {
            deviance: result.deviance,
            null_deviance,
            deviance_ratio: ratio,
            log_likelihood: result.log_likelihood,
            saturated_log_likelihood: pre.saturated_log_likelihood(),
        })
    }

    /// Print summary
    pub fn print(&self) {
        println!("Cox Deviance Summary");
        println!("====================");
        println!("Deviance:            {:.6}", self.deviance);
        println!("Null deviance:       {:.6}", self.null_deviance);
        println!("Deviance explained:  {:.6}", self.deviance_ratio);
        println!("Log-likelihood:      {:.6}", self.log_likelihood);
        println!("Saturated loglik:    {:.6}", self.saturated_log_likelihood);
    }
}
