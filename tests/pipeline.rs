//! End-to-end training on synthetic separable encodings.

use std::path::Path;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use facetrain::ENCODING_DIM;
use facetrain::dataset::{FaceDataset, StratifiedKFold, load_encodings, train_test_split};
use facetrain::labels::LabelEncoder;
use facetrain::ml::gbdt::GbdtFaceModel;
use facetrain::ml::metrics::{ConfusionMatrix, accuracy};
use facetrain::ml::svm::{Kernel, SvmFaceModel, SvmParams};
use facetrain::search::{GbdtSearchSpace, find_best_gbdt, find_best_svm};

/// Three identities as separable 128-d blobs: each identity concentrates
/// signal on its own block of dimensions.
fn synthetic_dataset(per_class: usize, seed: u64) -> FaceDataset {
    let identities = ["alice", "bob", "carol"];
    let mut rng = StdRng::seed_from_u64(seed);
    let mut encodings = Vec::new();
    let mut names = Vec::new();
    for (class_idx, name) in identities.iter().enumerate() {
        for _ in 0..per_class {
            let mut row = vec![0.0f64; ENCODING_DIM];
            for value in row.iter_mut() {
                *value += rng.random_range(-0.3..0.3);
            }
            for offset in 0..8 {
                row[class_idx * 8 + offset] += 3.0;
            }
            encodings.push(row);
            names.push(name.to_string());
        }
    }
    FaceDataset { encodings, names }
}

#[test]
fn trains_evaluates_and_persists_both_models() {
    let dataset = synthetic_dataset(30, 7);
    dataset.validate(ENCODING_DIM).unwrap();

    let encoder = LabelEncoder::fit(&dataset.names).unwrap();
    let labels = encoder.transform(&dataset.names).unwrap();

    let (train_idx, test_idx) = train_test_split(dataset.len(), 0.2, 1234).unwrap();
    let gather_x = |indices: &[usize]| -> Vec<Vec<f64>> {
        indices.iter().map(|&i| dataset.encodings[i].clone()).collect()
    };
    let gather_y =
        |indices: &[usize]| -> Vec<usize> { indices.iter().map(|&i| labels[i]).collect() };
    let x_train = gather_x(&train_idx);
    let y_train = gather_y(&train_idx);
    let x_test = gather_x(&test_idx);
    let y_test = gather_y(&test_idx);

    let folds = StratifiedKFold::new(3).split(&y_train).unwrap();

    // Small search spaces keep the test fast while exercising both paths.
    let svm_grid = vec![
        SvmParams {
            c: 1.0,
            kernel: Kernel::Linear,
        },
        SvmParams {
            c: 10.0,
            kernel: Kernel::Rbf { gamma: 0.01 },
        },
    ];
    let svm = find_best_svm(&x_train, &y_train, encoder.classes(), &folds, &svm_grid).unwrap();
    let svm_cm = ConfusionMatrix::from_predictions(
        &y_test,
        &svm.model.predict(&x_test),
        encoder.n_classes(),
    );
    assert!(
        accuracy(&svm_cm) > 0.9,
        "svm held-out accuracy {}",
        accuracy(&svm_cm)
    );

    let space = GbdtSearchSpace {
        rounds: 30,
        learning_rate: 0.3,
        bins: 16,
        min_leaf_weights: vec![1, 5],
        min_split_losses: vec![0.0, 0.5],
        subsamples: vec![0.8, 1.0],
        colsamples: vec![0.8, 1.0],
    };
    let gbdt = find_best_gbdt(
        &x_train,
        &y_train,
        encoder.classes(),
        &folds,
        &space,
        5,
        1234,
    )
    .unwrap();
    let gbdt_cm = ConfusionMatrix::from_predictions(
        &y_test,
        &gbdt.model.predict(&x_test),
        encoder.n_classes(),
    );
    assert!(
        accuracy(&gbdt_cm) > 0.9,
        "gbdt held-out accuracy {}",
        accuracy(&gbdt_cm)
    );

    // Persist all three artifacts and reload them.
    let dir = tempfile::tempdir().unwrap();
    let svm_path = dir.path().join("svm_face_recognizer.json");
    let gbdt_path = dir.path().join("gbdt_face_recognizer.json");
    let labels_path = dir.path().join("face_labels.json");
    svm.model.save_json(&svm_path).unwrap();
    gbdt.model.save_json(&gbdt_path).unwrap();
    encoder.save_json(&labels_path).unwrap();

    let svm_loaded = SvmFaceModel::load_json(&svm_path).unwrap();
    let gbdt_loaded = GbdtFaceModel::load_json(&gbdt_path).unwrap();
    let encoder_loaded = LabelEncoder::load_json(&labels_path).unwrap();

    assert_eq!(svm_loaded.predict(&x_test), svm.model.predict(&x_test));
    assert_eq!(gbdt_loaded.predict(&x_test), gbdt.model.predict(&x_test));
    assert_eq!(encoder_loaded.classes(), encoder.classes());

    // Predicted indices decode back to identity names.
    let decoded = encoder_loaded
        .inverse_transform(&svm_loaded.predict(&x_test))
        .unwrap();
    assert!(decoded.iter().all(|name| ["alice", "bob", "carol"].contains(&name.as_str())));
}

#[test]
fn encodings_file_roundtrips_through_loader() {
    let dataset = synthetic_dataset(2, 3);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("encodings.json");
    std::fs::write(&path, serde_json::to_vec(&dataset).unwrap()).unwrap();

    let loaded = load_encodings(Path::new(&path)).unwrap();
    assert_eq!(loaded.len(), dataset.len());
    assert_eq!(loaded.names, dataset.names);
}
