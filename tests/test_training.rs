//! Integration test: Model fitting, training engine and evaluation

use ndarray::{array, Array1, Array2};
use polars::prelude::*;
use tabula::data::loader::table_from_dataframe;
use tabula::data::Table;
use tabula::evaluation::{evaluate, BinaryConfusion, ClassificationMetrics, Metrics, RegressionMetrics};
use tabula::split::split;
use tabula::training::{
    fit, predict, DecisionTree, Hyperparameters, Model, ModelType, RandomForest, TaskType,
    TrainEngine, TrainingConfig,
};
use tabula::TabulaError;

fn classification_table() -> Table {
    let df = df!(
        "f1" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0,
                   1.5, 2.5, 3.5, 4.5, 5.5, 6.5, 7.5, 8.5, 9.5, 10.5],
        "f2" => &[10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0,
                   9.5, 8.5, 7.5, 6.5, 5.5, 4.5, 3.5, 2.5, 1.5, 0.5],
        "target" => &[0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0,
                      0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]
    )
    .unwrap();
    table_from_dataframe(&df).unwrap()
}

fn regression_table() -> Table {
    let x1: Vec<f64> = (1..=20).map(|i| i as f64).collect();
    let x2: Vec<f64> = (1..=20).map(|i| ((i * 7) % 11) as f64).collect();
    let target: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 3.0 * a - 2.0 * b + 5.0).collect();
    let df = df!("x1" => &x1, "x2" => &x2, "target" => &target).unwrap();
    table_from_dataframe(&df).unwrap()
}

#[test]
fn test_ols_recovers_line() {
    let x: Array2<f64> = Array2::from_shape_fn((5, 1), |(i, _)| (i + 1) as f64);
    let y: Array1<f64> = x.column(0).mapv(|v| 2.0 * v + 3.0);

    let model = fit(ModelType::LinearRegression, TaskType::Regression, &Hyperparameters::default(), &x, &y).unwrap();
    match &model {
        Model::Linear(m) => {
            let coef = m.coefficients.as_ref().unwrap();
            assert!((coef[0] - 2.0).abs() < 1e-9);
            assert!((m.intercept.unwrap() - 3.0).abs() < 1e-9);
        }
        other => panic!("unexpected model {:?}", other.model_type()),
    }

    let pred = predict(&model, &array![[10.0]]).unwrap();
    assert!((pred[0] - 23.0).abs() < 1e-9);
}

#[test]
fn test_collinear_features_are_singular() {
    let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
    let y = array![1.0, 2.0, 3.0, 4.0];
    let err = fit(ModelType::LinearRegression, TaskType::Regression, &Hyperparameters::default(), &x, &y).unwrap_err();
    assert!(matches!(err, TabulaError::SingularMatrix { .. }));
}

#[test]
fn test_engine_linear_regression() {
    let s = split(&regression_table(), 0.2, 42).unwrap();
    let config = TrainingConfig::new(ModelType::LinearRegression, "target").with_features(["x1", "x2"]);
    let outcome = TrainEngine::new(config).train(&s).unwrap();

    let m = outcome.test_metrics.as_regression().unwrap();
    assert!(m.mae < 1e-6);
    assert!((m.r2.unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(outcome.feature_names, vec!["x1", "x2"]);
    assert_eq!(outcome.coerced_cells, 0);
}

#[test]
fn test_engine_tree_and_forest_classification() {
    let s = split(&classification_table(), 0.25, 7).unwrap();

    for model_type in [ModelType::DecisionTree, ModelType::RandomForest] {
        let config = TrainingConfig::new(model_type, "target")
            .with_task(TaskType::Classification)
            .with_features(["f1", "f2"])
            .with_hyperparameters(Hyperparameters::default().with_n_trees(5));
        let outcome = TrainEngine::new(config).train(&s).unwrap();

        let train = outcome.train_metrics.as_classification().unwrap();
        assert_eq!(train.confusion.total(), 15);
        let test = outcome.test_metrics.as_classification().unwrap();
        assert_eq!(test.confusion.total(), 5);
        assert!((0.0..=1.0).contains(&test.accuracy));
        assert_eq!(outcome.feature_importance.len(), 2);
        assert!(outcome.multiclass.is_none());
    }
}

#[test]
fn test_tree_without_task_is_rejected() {
    let s = split(&classification_table(), 0.25, 7).unwrap();
    let config = TrainingConfig::new(ModelType::DecisionTree, "target").with_features(["f1"]);
    assert!(matches!(
        TrainEngine::new(config).train(&s),
        Err(TabulaError::ConfigError(_))
    ));
}

#[test]
fn test_logistic_rejects_multiclass_target() {
    let x = array![[0.0], [1.0], [2.0], [3.0]];
    let y = array![0.0, 1.0, 2.0, 1.0];
    let err = fit(
        ModelType::LogisticRegression,
        TaskType::Classification,
        &Hyperparameters::default(),
        &x,
        &y,
    )
    .unwrap_err();
    assert!(matches!(err, TabulaError::DataError(_)));
}

#[test]
fn test_forest_is_reproducible() {
    let x: Array2<f64> = Array2::from_shape_fn((40, 2), |(i, j)| ((i * (j + 3)) % 17) as f64);
    let y: Array1<f64> = (0..40).map(|i| ((i % 17) > 8) as u8 as f64).collect();

    let mut a = RandomForest::new_classifier(8).with_seed(3);
    let mut b = RandomForest::new_classifier(8).with_seed(3);
    a.fit(&x, &y).unwrap();
    b.fit(&x, &y).unwrap();
    assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
}

#[test]
fn test_tree_depth_limit() {
    let x: Array2<f64> = Array2::from_shape_fn((32, 1), |(i, _)| i as f64);
    let y: Array1<f64> = (0..32).map(|i| (i % 2) as f64).collect();

    let mut tree = DecisionTree::new_classifier().with_max_depth(2);
    tree.fit(&x, &y).unwrap();
    assert!(tree.root().unwrap().depth() <= 2);
}

#[test]
fn test_classification_metric_edge_cases() {
    // No positive predictions: precision falls back to 0
    let m = ClassificationMetrics::compute(&array![1.0, 1.0, 0.0], &array![0.0, 0.0, 0.0]).unwrap();
    assert_eq!(m.precision, 0.0);
    assert_eq!(m.recall, 0.0);
    assert_eq!(m.f1, 0.0);
    assert!((m.accuracy - 1.0 / 3.0).abs() < 1e-12);

    let c = BinaryConfusion { tp: 3, tn: 5, fp: 1, fn_: 1 };
    let m = ClassificationMetrics::from_confusion(c).unwrap();
    assert_eq!(m.accuracy, 0.8);
    assert_eq!(m.precision, 0.75);
    assert_eq!(m.recall, 0.75);

    let empty = BinaryConfusion { tp: 0, tn: 0, fp: 0, fn_: 0 };
    assert!(matches!(
        ClassificationMetrics::from_confusion(empty),
        Err(TabulaError::EvaluationError(_))
    ));
}

#[test]
fn test_regression_metrics_on_constant_target() {
    let y = array![4.0, 4.0, 4.0];
    let m = RegressionMetrics::compute(&y, &array![3.0, 4.0, 5.0]).unwrap();
    assert!(m.r2.is_none());
    assert!((m.mse - 2.0 / 3.0).abs() < 1e-12);
    assert!((m.rmse - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);

    match evaluate(TaskType::Regression, &y, &y).unwrap() {
        Metrics::Regression(r) => assert_eq!(r.mae, 0.0),
        other => panic!("unexpected metrics {:?}", other),
    }
}
