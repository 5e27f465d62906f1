use heartwise_core::{Classifier, ModelSettings};
use heartwise_trainer::{
    train_models_from_csv, LcgRng, LOGISTIC_REGRESSION, METRIC_COLUMNS, RANDOM_FOREST,
};
use std::fmt::Write as _;
use std::path::Path;

/// Cleveland-shaped raw rows: headerless, `?` for unknowns, targets 0-4
fn write_raw_csv(path: &Path, rows: usize) -> anyhow::Result<()> {
    let mut rng = LcgRng::new(2024);
    let mut text = String::new();
    for i in 0..rows {
        let age = 30 + rng.next_below(45);
        let sex = rng.next_below(2);
        let cp = 1 + rng.next_below(4);
        let trestbps = 94 + rng.next_below(100);
        let chol = 126 + rng.next_below(300);
        let fbs = rng.next_below(2);
        let restecg = rng.next_below(3);
        let thalach = 71 + rng.next_below(130);
        let exang = rng.next_below(2);
        let oldpeak = rng.next_below(60) as f64 / 10.0;
        let slope = 1 + rng.next_below(3);
        let ca = if i % 37 == 0 {
            "?".to_string()
        } else {
            format!("{}.0", rng.next_below(4))
        };
        let thal = ["3.0", "6.0", "7.0"][rng.next_below(3)];
        let risk = (age > 55) as u8 + (thalach < 140) as u8 + exang as u8 + (cp == 4) as u8;
        let target = if risk >= 2 { 1 + rng.next_below(4) } else { 0 };

        writeln!(
            text,
            "{age}.0,{sex}.0,{cp}.0,{trestbps}.0,{chol}.0,{fbs}.0,{restecg}.0,{thalach}.0,\
             {exang}.0,{oldpeak},{slope}.0,{ca},{thal},{target}"
        )?;
    }
    std::fs::write(path, text)?;
    Ok(())
}

fn settings() -> ModelSettings {
    let mut settings = ModelSettings {
        cv_folds: 3,
        logreg_max_iter: 200,
        ..ModelSettings::default()
    };
    settings.grid.n_estimators = vec![4, 8];
    settings.grid.max_depth = vec![0, 4];
    settings.grid.min_samples_split = vec![2];
    settings
}

#[test]
fn comparison_table_has_accuracy_for_every_model() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = dir.path().join("heart.csv");
    write_raw_csv(&csv, 120)?;

    let report = train_models_from_csv(&csv, &settings())?;

    let table = &report.comparison_table;
    assert!(table.columns().contains(&"accuracy"));
    assert_eq!(table.columns(), METRIC_COLUMNS.as_slice());
    let models: Vec<&str> = table.models().collect();
    assert_eq!(models, vec![LOGISTIC_REGRESSION, RANDOM_FOREST]);
    for model in models {
        let accuracy = table.get(model, "accuracy").expect("accuracy column");
        assert!((0.0..=1.0).contains(&accuracy));
    }

    let grid = report.grid.expect("grid search ran");
    assert_eq!(grid.scores.len(), 4);

    // rows with `?` in ca were dropped before splitting
    assert_eq!(report.train_rows + report.test_rows, 120 - 4);
    assert_eq!(report.log_reg_model.feature_count(), 13);
    Ok(())
}

#[test]
fn training_is_reproducible() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let csv = dir.path().join("heart.csv");
    write_raw_csv(&csv, 90)?;

    let first = train_models_from_csv(&csv, &settings())?;
    let second = train_models_from_csv(&csv, &settings())?;

    assert_eq!(first.random_forest_model, second.random_forest_model);
    assert_eq!(first.log_reg_model, second.log_reg_model);
    assert_eq!(first.comparison_table.rows.len(), 2);
    Ok(())
}
