use heartwise_core::{Classifier, ModelArtifact, Settings};
use heartwise_trainer::{LcgRng, METRIC_COLUMNS};
use heartwise_tracking::{
    latest_model_uri, run_experiment, save_final_model, ModelLocator, RunStatus, TrackingStore,
    COMPARISON_ARTIFACT, RANDOM_FOREST_ARTIFACT,
};
use std::fmt::Write as _;
use std::path::Path;

/// Headerless Cleveland-shaped rows with a few `?` cells
fn write_raw_csv(path: &Path, rows: usize) -> anyhow::Result<()> {
    let mut rng = LcgRng::new(77);
    let mut text = String::new();
    for i in 0..rows {
        let age = 30 + rng.next_below(45);
        let cp = 1 + rng.next_below(4);
        let thalach = 71 + rng.next_below(130);
        let exang = rng.next_below(2);
        let thal = if i % 29 == 0 { "?" } else { ["3.0", "6.0", "7.0"][rng.next_below(3)] };
        let risk = (age > 55) as u8 + (thalach < 140) as u8 + exang as u8 + (cp == 4) as u8;
        let target = if risk >= 2 { 1 + rng.next_below(4) } else { 0 };
        writeln!(
            text,
            "{age}.0,{}.0,{cp}.0,{}.0,{}.0,{}.0,{}.0,{thalach}.0,{exang}.0,{},{}.0,{}.0,{thal},{target}",
            rng.next_below(2),
            94 + rng.next_below(100),
            126 + rng.next_below(300),
            rng.next_below(2),
            rng.next_below(3),
            rng.next_below(60) as f64 / 10.0,
            1 + rng.next_below(3),
            rng.next_below(4),
        )?;
    }
    std::fs::write(path, text)?;
    Ok(())
}

fn settings(root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.data.dir = root.join("data");
    settings.tracking.mlruns_dir = root.join("mlruns");
    settings.tracking.experiment_name = "heart-test".to_string();
    settings.model.cv_folds = 3;
    settings.model.logreg_max_iter = 200;
    settings.model.rf_n_estimators = 6;
    settings.model.production_model_dir = root.join("models").join("production_model");
    settings
}

fn prepared(root: &Path) -> anyhow::Result<Settings> {
    let settings = settings(root);
    std::fs::create_dir_all(&settings.data.dir)?;
    write_raw_csv(&settings.data.csv_path(), 100)?;
    Ok(settings)
}

#[test]
fn experiment_records_two_finished_runs() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = prepared(dir.path())?;
    let store = TrackingStore::from_settings(&settings.tracking);

    let outcome = run_experiment(&settings)?;

    for run_id in [&outcome.log_reg_run_id, &outcome.random_forest_run_id] {
        let run = store.get_run(run_id)?;
        assert_eq!(run.status, RunStatus::Finished);
        let metrics = store.get_metrics(&run)?;
        assert!(metrics.contains_key("accuracy"));
        assert!(metrics.contains_key("roc_auc"));
    }

    let rf_run = store.get_run(&outcome.random_forest_run_id)?;
    assert_eq!(store.get_params(&rf_run)?["n_estimators"], "6");
    assert_eq!(store.get_params(&rf_run)?["max_depth"], "None");
    let run_dir = store.run_dir(&rf_run.experiment_id, &rf_run.run_id);
    let comparison = std::fs::read_to_string(run_dir.join("artifacts").join(COMPARISON_ARTIFACT))?;
    assert!(comparison.lines().next().unwrap_or_default().contains("accuracy"));
    assert_eq!(outcome.comparison_table.columns(), METRIC_COLUMNS.as_slice());

    assert_eq!(
        outcome.model_uri,
        format!("runs:/{}/{}", outcome.random_forest_run_id, RANDOM_FOREST_ARTIFACT)
    );
    Ok(())
}

#[test]
fn logged_model_resolves_and_scores() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = prepared(dir.path())?;
    let store = TrackingStore::from_settings(&settings.tracking);

    let outcome = run_experiment(&settings)?;

    let path = ModelLocator::parse(&outcome.model_uri)?.resolve(&store)?;
    let artifact = ModelArtifact::load(&path)?;
    assert_eq!(artifact.estimator, "random_forest");
    let proba = artifact
        .pipeline
        .predict_proba(&[vec![55.0, 1.0, 4.0, 140.0, 250.0, 0.0, 1.0, 120.0, 1.0, 2.0, 2.0, 1.0, 2.0]])
        .expect("forest exposes probabilities");
    assert!((0.0..=1.0).contains(&proba[0]));

    // the resolver also finds a model after one experiment
    let latest = latest_model_uri(&store, &settings.tracking.experiment_name)
        .expect("a model was logged");
    assert!(latest.starts_with("file://"));
    assert!(latest.ends_with("/artifacts"));
    let by_uri = ModelLocator::parse(&latest)?.resolve(&store)?;
    assert!(by_uri.join("model.json").is_file());
    // the forest is logged last, so it is the newest model
    assert_eq!(ModelArtifact::load(&by_uri)?.estimator, "random_forest");
    assert_eq!(by_uri, path);
    Ok(())
}

#[test]
fn packaging_replaces_the_production_directory() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = prepared(dir.path())?;
    let production = &settings.model.production_model_dir;
    std::fs::create_dir_all(production)?;
    std::fs::write(production.join("stale.txt"), "old")?;

    let saved = save_final_model(&settings)?;

    assert!(!production.join("stale.txt").exists());
    assert_eq!(saved.model_path, production.join("model.json"));
    let artifact = ModelArtifact::load(production)?;
    assert_eq!(artifact.pipeline.feature_count(), 13);
    Ok(())
}

#[test]
fn experiment_fails_cleanly_without_data() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    assert!(run_experiment(&settings).is_err());
}
