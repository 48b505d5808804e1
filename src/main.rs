//! Trains SVM- and boosted-stump-based face classifiers from 128-d face
//! encodings.
//!
//! The encodings file needs to be generated by the face-encoding step
//! first. Each run overwrites the model and label-encoder artifacts
//! wholesale.

use std::path::Path;

use facetrain::dataset::{StratifiedKFold, load_encodings, train_test_split};
use facetrain::labels::LabelEncoder;
use facetrain::ml::metrics::{ConfusionMatrix, classification_report};
use facetrain::search::{GbdtSearchSpace, default_svm_grid, find_best_gbdt, find_best_svm};
use facetrain::{FOLDS, PARAM_COMB, RANDOM_SEED, TEST_FRACTION, logging};

/// Path to known face encodings.
const KNOWN_FACE_ENCODINGS_PATH: &str = "encodings.json";
/// Where to save the SVM model.
const SVM_MODEL_PATH: &str = "svm_face_recognizer.json";
/// Where to save the boosted-stump model.
const GBDT_MODEL_PATH: &str = "gbdt_face_recognizer.json";
/// Where to save the label encoder.
const LABELS_PATH: &str = "face_labels.json";

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    logging::init().map_err(|err| err.to_string())?;

    // Load the known faces and embeddings.
    let dataset =
        load_encodings(Path::new(KNOWN_FACE_ENCODINGS_PATH)).map_err(|err| err.to_string())?;
    tracing::info!(
        samples = dataset.len(),
        path = KNOWN_FACE_ENCODINGS_PATH,
        "loaded face encodings"
    );

    // Encode the labels.
    tracing::info!("Encoding labels");
    let encoder = LabelEncoder::fit(&dataset.names).map_err(|err| err.to_string())?;
    let labels = encoder
        .transform(&dataset.names)
        .map_err(|err| err.to_string())?;
    tracing::info!(classes = encoder.n_classes(), "labels encoded");

    // Split data up into train and test sets.
    let (train_idx, test_idx) =
        train_test_split(dataset.len(), TEST_FRACTION, RANDOM_SEED).map_err(|err| err.to_string())?;
    let gather_x = |indices: &[usize]| -> Vec<Vec<f64>> {
        indices.iter().map(|&i| dataset.encodings[i].clone()).collect()
    };
    let gather_y = |indices: &[usize]| -> Vec<usize> { indices.iter().map(|&i| labels[i]).collect() };
    let x_train = gather_x(&train_idx);
    let y_train = gather_y(&train_idx);
    let x_test = gather_x(&test_idx);
    let y_test = gather_y(&test_idx);

    let folds = StratifiedKFold::new(FOLDS)
        .split(&y_train)
        .map_err(|err| err.to_string())?;

    // Find the best SVM classifier, evaluate and then save it.
    let svm = find_best_svm(
        &x_train,
        &y_train,
        encoder.classes(),
        &folds,
        &default_svm_grid(),
    )?;
    tracing::info!(
        params = %svm.params,
        cv_accuracy = svm.cv_accuracy,
        folds = FOLDS,
        "Evaluating SVM model"
    );
    report(&svm.model.predict(&x_test), &y_test, &encoder);
    tracing::info!(path = SVM_MODEL_PATH, "Saving SVM model");
    svm.model.save_json(Path::new(SVM_MODEL_PATH))?;

    // Find the best boosted-stump classifier, evaluate and save it.
    let gbdt = find_best_gbdt(
        &x_train,
        &y_train,
        encoder.classes(),
        &folds,
        &GbdtSearchSpace::default(),
        PARAM_COMB,
        RANDOM_SEED,
    )?;
    tracing::info!(
        params = %gbdt.params,
        cv_accuracy = gbdt.cv_accuracy,
        folds = FOLDS,
        combinations = PARAM_COMB,
        "Evaluating boosted-stump model"
    );
    report(&gbdt.model.predict(&x_test), &y_test, &encoder);
    tracing::info!(path = GBDT_MODEL_PATH, "Saving boosted-stump model");
    gbdt.model.save_json(Path::new(GBDT_MODEL_PATH))?;

    // Write the label encoder to disk.
    tracing::info!(path = LABELS_PATH, "Saving label encoder");
    encoder
        .save_json(Path::new(LABELS_PATH))
        .map_err(|err| err.to_string())?;

    Ok(())
}

/// Print the confusion matrix and classification report for held-out
/// predictions.
fn report(predictions: &[usize], truths: &[usize], encoder: &LabelEncoder) {
    let cm = ConfusionMatrix::from_predictions(truths, predictions, encoder.n_classes());
    println!("{}", cm.render());
    println!("{}", classification_report(&cm, encoder.classes()));
}
