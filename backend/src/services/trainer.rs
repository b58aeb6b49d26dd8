//! Ridge regression trainer for the linear scorer

use chrono::{Duration, NaiveDate, Utc};
use ndarray::{s, Array1, Array2, Axis};
use shared::{error_metrics, ErrorMetrics, FeatureVector, FEATURE_COUNT};

use crate::error::{AppError, AppResult};
use crate::services::features::{compose, LagSummary};
use crate::services::history::SalesHistory;
use crate::services::scorer::{LinearModel, Scorer};

/// Supervised rows built from sales history
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub features: Vec<FeatureVector>,
    pub targets: Vec<f64>,
    pub dates: Vec<NaiveDate>,
}

impl TrainingSet {
    /// One row per sale that has at least one earlier sale of the same item.
    ///
    /// Each row's lag and rolling slots see only the rows before it.
    pub fn from_history(history: &SalesHistory) -> Self {
        let mut set = TrainingSet::default();
        for record in history.records() {
            let prior = history.before(&record.key(), record.date);
            let Some(lags) = LagSummary::from_rows(prior) else {
                continue;
            };
            set.features.push(compose(&record.as_request(), &lags));
            set.targets.push(record.customer_demand);
            set.dates.push(record.date);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Split off the rows dated within the last `holdout_days` days
    pub fn split_holdout(self, holdout_days: u32) -> (TrainingSet, TrainingSet) {
        let Some(last) = self.dates.iter().max().copied() else {
            return (self, TrainingSet::default());
        };
        let cutoff = last - Duration::days(i64::from(holdout_days));
        let mut train = TrainingSet::default();
        let mut holdout = TrainingSet::default();
        for ((features, target), date) in self
            .features
            .into_iter()
            .zip(self.targets)
            .zip(self.dates)
        {
            let part = if date > cutoff { &mut holdout } else { &mut train };
            part.features.push(features);
            part.targets.push(target);
            part.dates.push(date);
        }
        (train, holdout)
    }
}

/// Error metrics of `scorer` over `set`; negative estimates count as zero demand
pub fn evaluate(scorer: &dyn Scorer, set: &TrainingSet) -> AppResult<ErrorMetrics> {
    let predicted = set
        .features
        .iter()
        .map(|f| scorer.score(f).map(|y| y.max(0.0)))
        .collect::<Result<Vec<f64>, _>>()?;
    error_metrics(&set.targets, &predicted)
        .map_err(|e| AppError::Internal(format!("evaluation failed: {}", e)))
}

/// Fits a standardized ridge regression with an unpenalized intercept
#[derive(Debug, Clone, Copy)]
pub struct RidgeTrainer {
    lambda: f64,
}

impl RidgeTrainer {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }

    pub fn fit(&self, set: &TrainingSet) -> AppResult<LinearModel> {
        if set.is_empty() {
            return Err(AppError::Internal("no training rows".to_string()));
        }
        let x = Array2::from_shape_fn((set.len(), FEATURE_COUNT), |(i, j)| {
            set.features[i].as_slice()[j]
        });
        let y = Array1::from_vec(set.targets.clone());

        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| AppError::Internal("no training rows".to_string()))?;
        // population std; constant columns keep a unit scale
        let scales = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-12 { s } else { 1.0 });
        let z = (&x - &means) / &scales;
        let y_mean = y.mean().unwrap_or(0.0);

        // normal equations: (ZᵀZ + λI) β = Zᵀ(y - ȳ)
        let mut gram = z.t().dot(&z);
        gram.diag_mut().mapv_inplace(|d| d + self.lambda);
        let rhs = z.t().dot(&(&y - y_mean));

        let coefficients = cholesky_solve(&gram, &rhs)
            .ok_or_else(|| AppError::Internal("training system is singular".to_string()))?;

        let trained_at = Utc::now();
        Ok(LinearModel {
            version: trained_at.format("%Y%m%d%H%M%S").to_string(),
            trained_at,
            feature_names: LinearModel::contract_feature_names(),
            means: means.to_vec(),
            scales: scales.to_vec(),
            coefficients: coefficients.to_vec(),
            intercept: y_mean,
        })
    }
}

/// Solve `a x = b` for symmetric positive definite `a`.
///
/// `None` when `a` is not positive definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let row_j = l.slice(s![j, ..j]);
        let diag = a[[j, j]] - row_j.dot(&row_j);
        if diag <= 1e-12 {
            return None;
        }
        let diag = diag.sqrt();
        l[[j, j]] = diag;
        for i in j + 1..n {
            let below = a[[i, j]] - l.slice(s![i, ..j]).dot(&l.slice(s![j, ..j]));
            l[[i, j]] = below / diag;
        }
    }

    // L y = b, then Lᵀ x = y
    let mut forward = Array1::<f64>::zeros(n);
    for i in 0..n {
        let known = l.slice(s![i, ..i]).dot(&forward.slice(s![..i]));
        forward[i] = (b[i] - known) / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let known = l.slice(s![i + 1.., i]).dot(&x.slice(s![i + 1..]));
        x[i] = (forward[i] - known) / l[[i, i]];
    }
    Some(x)
}
