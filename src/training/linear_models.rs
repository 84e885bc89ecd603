//! Linear model implementations

use super::models::{check_fit_inputs, check_predict_inputs};
use crate::error::{Result, TabulaError};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pivots with a smaller magnitude are treated as zero
pub const PIVOT_EPSILON: f64 = 1e-10;

/// Prepend a column of ones to `x`
fn with_bias_column(x: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::ones((x.nrows(), x.ncols() + 1));
    out.slice_mut(s![.., 1..]).assign(x);
    out
}

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting.
///
/// Fails with `SingularMatrix` at the first column whose best pivot is below
/// [`PIVOT_EPSILON`]; the failure is not retried with regularization.
pub fn matrix_inverse(m: &Array2<f64>) -> Result<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return Err(TabulaError::ShapeError {
            expected: format!("square matrix, {} columns", n),
            actual: format!("{} columns", m.ncols()),
        });
    }

    // [M | I]
    let mut aug = Array2::zeros((n, 2 * n));
    aug.slice_mut(s![.., ..n]).assign(m);
    for i in 0..n {
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        if !(pivot.abs() >= PIVOT_EPSILON) {
            return Err(TabulaError::SingularMatrix { column: col, pivot });
        }

        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    for j in 0..2 * n {
                        aug[[row, j]] -= factor * aug[[col, j]];
                    }
                }
            }
        }
    }

    Ok(aug.slice(s![.., n..]).to_owned())
}

/// Ordinary least squares regression solved with the normal equation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegression {
    /// One weight per feature
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    /// Solve `θ = (XᵀX)⁻¹Xᵀy` with a leading bias column
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_inputs(x, y)?;

        let xb = with_bias_column(x);
        let xtx = xb.t().dot(&xb);
        let xty = xb.t().dot(y);
        let theta = matrix_inverse(&xtx)?.dot(&xty);

        if theta.iter().any(|v| !v.is_finite()) {
            return Err(TabulaError::NumericalError(
                "Normal equation produced non-finite coefficients".to_string(),
            ));
        }

        debug!(n_features = x.ncols(), intercept = theta[0], "Fitted linear regression");

        self.intercept = Some(theta[0]);
        self.coefficients = Some(theta.slice(s![1..]).to_owned());
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (coefficients, intercept) = match (&self.coefficients, self.intercept) {
            (Some(c), Some(b)) => (c, b),
            _ => return Err(TabulaError::ModelNotFitted),
        };
        check_predict_inputs(x, coefficients.len())?;
        Ok(x.dot(coefficients) + intercept)
    }
}

/// Binary logistic regression fitted by batch gradient descent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
    pub learning_rate: f64,
    /// Fixed number of full-batch updates
    pub iterations: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            learning_rate: 0.01,
            iterations: 1000,
        }
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    #[inline]
    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let e = z.exp();
            e / (1.0 + e)
        }
    }

    /// Fit on labels in `{0, 1}` using the mean cross-entropy gradient
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_fit_inputs(x, y)?;

        if let Some(bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
            return Err(TabulaError::DataError(format!(
                "Logistic regression needs labels in {{0, 1}}, found {}",
                bad
            )));
        }

        let xb = with_bias_column(x);
        let n = xb.nrows() as f64;
        let mut theta = Array1::<f64>::zeros(xb.ncols());

        for _ in 0..self.iterations {
            let p = xb.dot(&theta).mapv(Self::sigmoid);
            let errors = &p - y;
            let gradient = xb.t().dot(&errors) / n;
            theta.scaled_add(-self.learning_rate, &gradient);
        }

        if theta.iter().any(|v| !v.is_finite()) {
            return Err(TabulaError::NumericalError(format!(
                "Gradient descent diverged with learning_rate = {}",
                self.learning_rate
            )));
        }

        debug!(
            iterations = self.iterations,
            learning_rate = self.learning_rate,
            "Fitted logistic regression"
        );

        self.intercept = Some(theta[0]);
        self.coefficients = Some(theta.slice(s![1..]).to_owned());
        Ok(self)
    }

    /// Probability of the positive class for each row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (coefficients, intercept) = match (&self.coefficients, self.intercept) {
            (Some(c), Some(b)) => (c, b),
            _ => return Err(TabulaError::ModelNotFitted),
        };
        check_predict_inputs(x, coefficients.len())?;
        Ok((x.dot(coefficients) + intercept).mapv(Self::sigmoid))
    }

    /// Class labels at the 0.5 threshold
    pub fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_regression_recovers_line() {
        let x = Array2::from_shape_fn((10, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| 2.0 * v + 3.0);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        assert!((model.intercept.unwrap() - 3.0).abs() < 1e-8);
        assert!((model.coefficients.as_ref().unwrap()[0] - 2.0).abs() < 1e-8);

        let pred = model.predict(&array![[20.0]]).unwrap();
        assert!((pred[0] - 43.0).abs() < 1e-6);
    }

    #[test]
    fn test_linear_regression_multivariate() {
        let x = array![
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [2.0, 1.0],
            [3.0, 5.0],
        ];
        let y = x.map_axis(ndarray::Axis(1), |r| 1.0 + 0.5 * r[0] - 2.0 * r[1]);
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let coef = model.coefficients.as_ref().unwrap();
        assert!((coef[0] - 0.5).abs() < 1e-8);
        assert!((coef[1] + 2.0).abs() < 1e-8);
    }

    #[test]
    fn test_collinear_features_are_singular() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];
        let err = LinearRegression::new().fit(&x, &y).unwrap_err();
        assert_eq!(err.code(), "SINGULAR_MATRIX");
    }

    #[test]
    fn test_matrix_inverse() {
        let m = array![[4.0, 7.0], [2.0, 6.0]];
        let inv = matrix_inverse(&m).unwrap();
        let identity = m.dot(&inv);
        assert!((identity[[0, 0]] - 1.0).abs() < 1e-10);
        assert!(identity[[0, 1]].abs() < 1e-10);
        assert!(identity[[1, 0]].abs() < 1e-10);
        assert!((identity[[1, 1]] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_unfitted_predict() {
        let err = LinearRegression::new().predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, TabulaError::ModelNotFitted));
    }

    #[test]
    fn test_logistic_regression_separable() {
        let x = array![[-4.0], [-3.0], [-2.0], [-1.0], [1.0], [2.0], [3.0], [4.0]];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];

        let mut model = LogisticRegression::new()
            .with_learning_rate(0.1)
            .with_iterations(2000);
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(model.predict_labels(&x).unwrap(), y);
    }

    #[test]
    fn test_logistic_rejects_non_binary_labels() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![0.0, 1.0, 2.0];
        let err = LogisticRegression::new().fit(&x, &y).unwrap_err();
        assert!(matches!(err, TabulaError::DataError(_)));
    }
}
