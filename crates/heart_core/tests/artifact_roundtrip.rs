use heartwise_core::{
    Classifier, Estimator, FittedPipeline, ModelArtifact, Node, PatientRecord, RandomForest,
    Tree, FEATURE_COUNT,
};

fn forest() -> FittedPipeline {
    // split on age (feature 0) then on thalach (feature 7)
    let tree = Tree::new(vec![
        Node::internal(0, 0, 55.0, 1, 2),
        Node::leaf(1, 0.2),
        Node::internal(2, 7, 140.0, 3, 4),
        Node::leaf(3, 0.9),
        Node::leaf(4, 0.4),
    ]);
    FittedPipeline::new(
        None,
        Estimator::RandomForest(RandomForest {
            trees: vec![tree.clone(), tree],
            feature_count: FEATURE_COUNT,
        }),
    )
}

#[test]
fn persisted_forest_scores_like_the_original() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let pipeline = forest();
    ModelArtifact::new(pipeline.clone()).save(dir.path())?;

    let loaded = ModelArtifact::load(dir.path())?;
    assert_eq!(loaded.estimator, "random_forest");
    assert_eq!(loaded.feature_names.len(), FEATURE_COUNT);

    let patient = PatientRecord::from_features(&[
        63.0, 1.0, 3.0, 145.0, 233.0, 1.0, 0.0, 130.0, 0.0, 2.3, 0.0, 0.0, 1.0,
    ])?;
    let rows = vec![patient.to_features().to_vec()];

    assert_eq!(loaded.pipeline.predict(&rows), pipeline.predict(&rows));
    assert_eq!(loaded.pipeline.predict(&rows), vec![1]);
    let proba = loaded.pipeline.predict_proba(&rows).unwrap_or_default();
    assert!((proba[0] - 0.9).abs() < 1e-12);
    Ok(())
}

#[test]
fn saving_twice_yields_identical_hash_for_identical_content() -> anyhow::Result<()> {
    let a = tempfile::tempdir()?;
    let b = tempfile::tempdir()?;
    let artifact = ModelArtifact::new(forest());

    let first = artifact.save(a.path())?;
    let second = artifact.save(b.path())?;
    assert_eq!(first.hash, second.hash);
    Ok(())
}
