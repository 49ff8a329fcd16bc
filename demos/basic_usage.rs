use cox_deviance::{
    metrics::DevianceSummary, CoxDevianceEvaluator, EvaluationConfig, SurvivalData,
    TiedRiskPreprocessor,
};
use ndarray::{Array1, Array2};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Cox Deviance - Basic Usage Example");
    println!("==================================\n");

    // Follow-up times (months), several patients fail in the same month
    let times = vec![1.0, 2.0, 3.0, 3.0, 5.0, 6.0, 6.0, 6.0, 7.0, 9.0,
                     2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 8.0, 9.0, 10.0, 12.0];

    let events = vec![true, false, true, true, false, true, true, true, false, true,
                      true, false, true, true, false, true, true, false, true, false];

    // Case weights, e.g. from inverse-probability weighting
    let weights = vec![1.0, 1.0, 0.5, 1.5, 1.0, 1.0, 2.0, 1.0, 1.0, 1.0,
                       1.0, 0.5, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0];

    let data = SurvivalData::new(times, events)?.with_sample_weight(weights)?;

    println!("Dataset Information:");
    println!("  - Number of samples: {}", data.n_samples());
    println!("  - Number of events: {}", data.n_events());
    println!("  - Number of censored: {}", data.n_samples() - data.n_events());
    println!();

    // Sort and aggregate ties once per dataset
    let pre = TiedRiskPreprocessor::new(&data)?;

    println!("Risk-set tables:");
    println!("  - Distinct event times: {}", pre.n_event_times());
    for group in &pre.tie_groups().groups {
        println!("  - {} events tied at t = {}", group.positions.len(), group.time);
    }
    println!("  - Saturated log-likelihood: {:.6}", pre.saturated_log_likelihood());
    println!();

    // Example 1: one evaluation
    println!("Example 1: Single Evaluation");
    println!("----------------------------");

    let eta = Array1::from(vec![0.8, -0.2, 0.5, 0.6, -0.4, 0.3, 0.4, 0.2, -0.6, 0.1,
                                0.7, -0.3, 0.2, 0.1, -0.5, 0.0, 0.1, -0.7, -0.2, -0.9]);
    let result = pre.deviance(eta.view())?;

    println!("Deviance: {:.6}", result.deviance);
    if let (Some(grad), Some(hess)) = (&result.gradient, &result.diag_hessian) {
        println!("{:<8} {:>12} {:>14}", "row", "gradient", "diag hessian");
        println!("{:-<36}", "");
        for i in 0..5 {
            println!("{:<8} {:>12.6} {:>14.6}", i, grad[i], hess[i]);
        }
        println!("...");
    }
    println!();

    // Example 2: a few path steps, the way an elastic net driver calls in
    println!("Example 2: Path Steps (parallel batch)");
    println!("--------------------------------------");

    let steps = 5;
    let candidates = Array2::from_shape_fn((steps, eta.len()), |(r, c)| {
        eta[c] * r as f64 / (steps - 1) as f64
    });
    let evaluator = CoxDevianceEvaluator::new(EvaluationConfig::deviance_only());
    for (step, res) in evaluator.evaluate_batch(&pre, candidates.view())?.iter().enumerate() {
        println!("  step {}: deviance = {:.6}", step, res.deviance);
    }
    println!();

    // Example 3: summary
    println!("Example 3: Deviance Summary");
    println!("---------------------------");
    DevianceSummary::compute(&pre, eta.view())?.print();

    Ok(())
}
