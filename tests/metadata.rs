use std::path::{Path, PathBuf};
use std::sync::Arc;

use zarrs::array::{Array, ArrayMetadata};
use zarrs::filesystem::FilesystemStore;
use zarrs_chunkshape::{
    Error, StorageOptions,
    metadata::{
        array_metadata, chunk_grid_metadata, codec_chain_metadata, data_type_metadata,
        element_width, lookup_data_type,
    },
};

const N1280: [u64; 3] = [720, 1920, 2560];

fn options(json: &str) -> StorageOptions {
    env_logger::try_init().ok();
    StorageOptions::from_json_str(json).expect("valid storage options")
}

fn tmp_dir(name: &str) -> PathBuf {
    let dpath = Path::new(env!("CARGO_TARGET_TMPDIR")).join(name);
    if dpath.exists() {
        std::fs::remove_dir_all(&dpath).expect("clear previous test output");
    }
    std::fs::create_dir_all(&dpath).expect("create test output directory");
    dpath
}

#[test]
fn test_parse_storage_options() {
    let opts = options(r#"{"compress": 4, "shuffle": true, "chunksize": 1e6}"#);
    assert_eq!(opts.compress, 4);
    assert!(opts.shuffle);
    assert_eq!(opts.chunksize, 1e6);
    assert_eq!(opts.word_size, None);
    assert_eq!(opts.tolerance, None);
}

#[test]
fn test_storage_options_defaults() {
    let opts = options(r#"{"chunksize": 1000000}"#);
    assert_eq!(opts, StorageOptions::new(1e6));
    let solver = opts.solver(None);
    assert_eq!(solver.element_width(), 4);
    assert_eq!(solver.tolerance(), 0.8);
}

#[test]
fn test_word_size_overrides_data_type() {
    let opts = options(r#"{"chunksize": 1e6, "word_size": 2}"#);
    assert_eq!(opts.solver(Some(8)).element_width(), 2);
    let opts = options(r#"{"chunksize": 1e6}"#);
    assert_eq!(opts.solver(Some(8)).element_width(), 8);
}

#[test]
fn test_storage_options_from_job() {
    let job = serde_json::json!({
        "experiment_detail": {"source_id": "N1280-GA7EA"},
        "storage_options": {"compress": 4, "shuffle": true, "chunksize": 1e6},
        "tasks": [],
    });
    let opts = StorageOptions::from_job_configuration(&job).unwrap();
    assert_eq!(opts.compress, 4);
    assert_eq!(opts.solver(None).compute(&N1280).unwrap(), vec![20, 80, 160]);
}

#[test]
fn test_job_without_storage_options() {
    let job = serde_json::json!({"tasks": []});
    assert!(matches!(
        StorageOptions::from_job_configuration(&job),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_invalid_storage_options() {
    assert!(matches!(
        StorageOptions::from_json_str(r#"{"chunksize": 1e6, "compress": 10}"#),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        StorageOptions::from_json_str(r#"{"chunksize": -5}"#),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        StorageOptions::from_json_str(r#"{"chunksize": 1e6, "tolerance": 2.0}"#),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        StorageOptions::from_json_str(r#"{"compress": 4}"#),
        Err(Error::SerdeJson(_))
    ));
    assert!(matches!(
        StorageOptions::from_json_str(r#"{"chunksize": 1e6, "chunks": 3}"#),
        Err(Error::SerdeJson(_))
    ));
}

#[test]
fn test_chunk_grid_metadata() {
    let meta = chunk_grid_metadata(&[20, 80, 160]).unwrap();
    let value = serde_json::to_value(&meta).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"name": "regular", "configuration": {"chunk_shape": [20, 80, 160]}})
    );
    assert!(matches!(
        chunk_grid_metadata(&[20, 0, 160]),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_codec_chain() {
    let codecs = codec_chain_metadata(&StorageOptions::new(1e6)).unwrap();
    let names: Vec<_> = codecs.iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["bytes"]);

    let codecs = codec_chain_metadata(&options(r#"{"chunksize": 1e6, "compress": 4}"#)).unwrap();
    let names: Vec<_> = codecs.iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["bytes", "gzip"]);
    let value = serde_json::to_value(&codecs).unwrap();
    assert_eq!(value[0]["configuration"]["endian"], serde_json::json!("little"));
    assert_eq!(value[1]["configuration"]["level"], serde_json::json!(4));
}

#[test]
fn test_gzip_level_checked_by_codec() {
    let mut opts = StorageOptions::new(1e6);
    assert!(opts.gzip_codec().unwrap().is_none());
    opts.compress = 9;
    assert!(opts.gzip_codec().unwrap().is_some());
    opts.compress = 10;
    assert!(matches!(opts.gzip_codec(), Err(Error::Configuration(_))));
    assert!(matches!(
        codec_chain_metadata(&opts),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_element_width() {
    let width = |name| element_width(&lookup_data_type(name).unwrap()).unwrap();
    assert_eq!(width("uint8"), 1);
    assert_eq!(width("int16"), 2);
    assert_eq!(width("float32"), 4);
    assert_eq!(width("float64"), 8);
    assert!(matches!(lookup_data_type("string"), Err(Error::General(_))));
}

#[test]
fn test_data_type_metadata() {
    let meta = data_type_metadata(&lookup_data_type("float32").unwrap());
    assert_eq!(meta.name(), "float32");
    assert_eq!(serde_json::to_value(&meta).unwrap(), serde_json::json!("float32"));
}

#[test]
fn test_array_metadata_uses_data_type_width() {
    let opts = options(r#"{"chunksize": 1e6, "compress": 4, "shuffle": true}"#);
    let (_, single) = array_metadata(&N1280, "float32", &opts).unwrap();
    let (_, double) = array_metadata(&N1280, "float64", &opts).unwrap();
    assert_eq!(single.chunk_shape, vec![20, 80, 160]);
    assert_eq!(double.element_width, 8);
    assert_eq!(double.chunk_shape, vec![16, 64, 128]);
}

#[test]
fn test_array_metadata_json() {
    let opts = options(r#"{"chunksize": 1e6, "compress": 4, "shuffle": true}"#);
    let (meta, _) = array_metadata(&N1280, "float32", &opts).unwrap();
    let value = serde_json::to_value(&meta).unwrap();
    assert_eq!(value["shape"], serde_json::json!([720, 1920, 2560]));
    assert_eq!(value["data_type"], serde_json::json!("float32"));
    assert_eq!(
        value["chunk_grid"]["configuration"]["chunk_shape"],
        serde_json::json!([20, 80, 160])
    );
    assert_eq!(value["attributes"]["shuffle"], serde_json::json!(true));
}

#[test]
fn test_array_metadata_rejects_bad_input() {
    let opts = StorageOptions::new(1e6);
    assert!(matches!(
        array_metadata(&[100], "float32", &opts),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        array_metadata(&N1280, "complex64", &opts),
        Err(Error::General(_))
    ));
}

#[test]
fn test_store_and_reopen() {
    let dpath = tmp_dir("store_and_reopen");
    let store = Arc::new(FilesystemStore::new(&dpath).expect("should be able to create store"));
    let opts = options(r#"{"chunksize": 1e6, "compress": 4}"#);
    let (meta, _) = array_metadata(&N1280, "float32", &opts).unwrap();

    let array = Array::new_with_metadata(store.clone(), "/n1280", ArrayMetadata::V3(meta))
        .expect("create array");
    array.store_metadata().expect("store metadata");

    let reopened = Array::open(store.clone(), "/n1280").expect("open array");
    assert_eq!(reopened.shape(), N1280.as_slice());

    let written: serde_json::Value = serde_json::from_slice(
        &std::fs::read(dpath.join("n1280").join("zarr.json")).expect("read zarr.json"),
    )
    .unwrap();
    assert_eq!(
        written["chunk_grid"]["configuration"]["chunk_shape"],
        serde_json::json!([20, 80, 160])
    );
}
