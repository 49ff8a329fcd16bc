//! # cox deviance
//!
//! tie-aware cox partial-likelihood deviance for regularized survival fits -
//! the inner kernel an elastic net path solver calls once per candidate
//! linear predictor
//!
//! ## what you get
//!
//! - one-time sort + breslow tie aggregation of right-censored data
//! - deviance, gradient and diagonal hessian in a single O(n) pass
//! - outputs always in your original row order
//! - parallel batch evaluation over many candidate predictors
//!
//! ## quick start
//!
//! ```rust
//! use cox_deviance::{SurvivalData, TiedRiskPreprocessor};
//! use ndarray::Array1;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // times + event flags (true = event, false = censored)
//! let times = vec![2.0, 4.0, 3.0, 5.0, 6.5, 7.0, 7.0, 7.0, 7.0];
//! let status = vec![false, true, true, false, false, true, true, true, true];
//! let data = SurvivalData::new(times, status)?;
//!
//! // sort + aggregate ties once
//! let pre = TiedRiskPreprocessor::new(&data)?;
//!
//! // evaluate as often as the optimizer needs
//! let eta = Array1::<f64>::ones(9);
//! let result = pre.deviance(eta.view())?;
//! assert!(result.deviance.is_finite());
//! assert_eq!(result.gradient.map(|g| g.len()), Some(9));
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod deviance;
pub mod error;
pub mod metrics;
pub mod risk_set;
pub mod ties;

pub use data::SurvivalData;
pub use deviance::{CoxDevianceEvaluator, CoxDevianceResult, EvaluationConfig};
pub use error::{CoxError, Result};
pub use risk_set::{DataWarning, TiedRiskPreprocessor};
