use std::path::Path;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use rusfm::data::{AttributeGroups, Dataset, SparseMatrix};
use rusfm::mcmc;
use rusfm::model::{self, Model};
use rusfm::relation::{mapping, RelationData, RelationJoin};
use rusfm::task::Task;
use rusfm::Error;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Joins the rows of `data` into one table with the relation attributes inlined.
fn materialize(data: &Dataset) -> Dataset {
    let mut x = SparseMatrix::new(data.num_attributes());
    let mut row = Vec::new();
    for c in 0..data.num_cases() {
        data.expand_row(c, &mut row);
        x.push_row(&row);
    }
    Dataset::new(x, data.target.clone()).unwrap()
}

fn model() -> Model {
    let mut model = Model::new(
        model::Params::new(4)
            .with_num_factor(2)
            .with_regularization(0.1, 0.1, 0.1)
            .with_init(0.0, 0.1),
    );
    model.init(&mut StdRng::seed_from_u64(11)).unwrap();
    model
}

#[test]
fn relational_als_matches_materialized_table() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let train_path = write(dir.path(), "train.libfm", "4 0:1\n1 1:1\n2 0:1 1:1\n3 0:1\n");
    let test_path = write(dir.path(), "test.libfm", "3 0:1\n2 1:1\n");
    let user_path = write(dir.path(), "user.libfm", "0:1 1:0.5\n1:1\n");
    let train_join = dir.path().join("train.user");
    mapping::write_binary(&train_join, &[0, 1, 1, 0]).unwrap();
    let test_join = write(dir.path(), "test.user", "1\n0\n");

    let user = Arc::new(RelationData::load(&user_path, 2).unwrap());
    let train = Dataset::load(&train_path).unwrap();
    let n = train.num_cases();
    let train = train
        .with_relation(RelationJoin::load(&train_join, user.clone(), n).unwrap())
        .unwrap();
    let test = Dataset::load(&test_path).unwrap();
    let n = test.num_cases();
    let test = test
        .with_relation(RelationJoin::load(&test_join, user, n).unwrap())
        .unwrap();
    assert_eq!(train.num_attributes(), 4);

    let groups = AttributeGroups::from_assignment(vec![0, 0, 1, 1]);
    let flat_train = materialize(&train).with_groups(groups);
    let flat_test = materialize(&test);

    let task = Task::regression(&train);
    let params = mcmc::Params::als().with_num_iter(3);
    let mut joined = model();
    let mut flat = model();
    let a = mcmc::solve(&mut joined, &task, &train, &test, &params, None).unwrap();
    let b = mcmc::solve(&mut flat, &task, &flat_train, &flat_test, &params, None).unwrap();

    assert_abs_diff_eq!(joined.w0, flat.w0, epsilon = 1e-9);
    for (x, y) in joined.w.iter().zip(flat.w.iter()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-9);
    }
    for (x, y) in joined.v.iter().zip(flat.v.iter()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-9);
    }
    for (x, y) in a.predictions.iter().zip(b.predictions.iter()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-9);
    }
}

#[test]
fn join_with_wrong_length_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let user_path = write(dir.path(), "user.libfm", "0:1\n1:1\n");
    let join_path = write(dir.path(), "train.user", "0\n1\n1\n");
    let user = Arc::new(RelationData::load(&user_path, 2).unwrap());
    assert!(matches!(
        RelationJoin::load(&join_path, user, 4),
        Err(Error::DataIntegrity(_))
    ));
}

#[test]
fn join_beyond_relation_rows_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let user_path = write(dir.path(), "user.libfm", "0:1\n");
    let join_path = dir.path().join("train.user");
    mapping::write_binary(&join_path, &[0, 1]).unwrap();
    let user = Arc::new(RelationData::load(&user_path, 2).unwrap());
    assert!(matches!(
        RelationJoin::load(&join_path, user, 2),
        Err(Error::DataIntegrity(_))
    ));
}
