//! Reading and writing the model artifact.
//!
//! An artifact is a deflate-compressed zip with four JSON entries:
//!
//! | entry | content |
//! |---|---|
//! | `manifest.json` | [`ModelMetadata`] plus the SHA-256 of each other entry |
//! | `labels.json` | label vocabulary, in class index order |
//! | `featurizer.json` | featurizer settings and term dictionary |
//! | `booster.json` | one-vs-rest tree ensembles |

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use log::{error, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::classifier::{
    BoostedTreeClassifier, ClassifierError, LabelVocabulary, Model, ModelMetadata, TextFeaturizer,
    FORMAT_VERSION,
};

const MANIFEST_ENTRY: &str = "manifest.json";
const LABELS_ENTRY: &str = "labels.json";
const FEATURIZER_ENTRY: &str = "featurizer.json";
const BOOSTER_ENTRY: &str = "booster.json";

/// Where artifacts are read from and written to.
pub trait ModelStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

impl<S: ModelStore + ?Sized> ModelStore for &S {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        (**self).write(path, bytes)
    }
}

/// Plain filesystem store. Writes create missing parent directories and
/// replace any existing file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsModelStore;

impl ModelStore for FsModelStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, bytes)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    metadata: ModelMetadata,
    checksums: BTreeMap<String, String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn to_json<T: Serialize>(value: &T, entry: &str) -> Result<Vec<u8>, ClassifierError> {
    serde_json::to_vec(value)
        .map_err(|e| ClassifierError::Io(io::Error::other(format!("Failed to serialize {}: {}", entry, e))))
}

/// Serializes a model into artifact bytes.
pub fn encode(model: &Model) -> Result<Vec<u8>, ClassifierError> {
    let entries = [
        (LABELS_ENTRY, to_json(&model.labels, LABELS_ENTRY)?),
        (FEATURIZER_ENTRY, to_json(&model.featurizer, FEATURIZER_ENTRY)?),
        (BOOSTER_ENTRY, to_json(&model.booster, BOOSTER_ENTRY)?),
    ];
    let manifest = Manifest {
        metadata: model.metadata.clone(),
        checksums: entries
            .iter()
            .map(|(name, bytes)| (name.to_string(), sha256_hex(bytes)))
            .collect(),
    };
    let manifest_bytes = to_json(&manifest, MANIFEST_ENTRY)?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let zip_err = |e: zip::result::ZipError| ClassifierError::Io(io::Error::other(e));

    writer.start_file(MANIFEST_ENTRY, options).map_err(zip_err)?;
    writer.write_all(&manifest_bytes)?;
    for (name, bytes) in &entries {
        writer.start_file(*name, options).map_err(zip_err)?;
        writer.write_all(bytes)?;
    }
    let cursor = writer.finish().map_err(zip_err)?;
    Ok(cursor.into_inner())
}

fn read_entry<R: Read + io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>, ClassifierError> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| ClassifierError::ModelLoad(format!("Missing entry '{}': {}", name, e)))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| ClassifierError::ModelLoad(format!("Cannot read entry '{}': {}", name, e)))?;
    Ok(bytes)
}

fn read_verified<R: Read + io::Seek>(
    archive: &mut ZipArchive<R>,
    manifest: &Manifest,
    name: &str,
) -> Result<Vec<u8>, ClassifierError> {
    let bytes = read_entry(archive, name)?;
    let expected = manifest
        .checksums
        .get(name)
        .ok_or_else(|| ClassifierError::ModelLoad(format!("Manifest has no checksum for '{}'", name)))?;
    let actual = sha256_hex(&bytes);
    if &actual != expected {
        error!("Checksum mismatch for {}: expected {}, got {}", name, expected, actual);
        return Err(ClassifierError::ModelLoad(format!(
            "Checksum mismatch for '{}': expected {}, got {}",
            name, expected, actual
        )));
    }
    Ok(bytes)
}

fn from_json<'a, T: Deserialize<'a>>(bytes: &'a [u8], name: &str) -> Result<T, ClassifierError> {
    serde_json::from_slice(bytes)
        .map_err(|e| ClassifierError::ModelLoad(format!("Invalid '{}': {}", name, e)))
}

/// Decodes artifact bytes back into a model.
///
/// # Errors
/// - `ModelLoad` if the bytes are not a zip, an entry is missing or fails its
///   checksum, the format version is not [`FORMAT_VERSION`], or the entries
///   disagree with the class and feature counts in the manifest
pub fn decode(bytes: &[u8]) -> Result<Model, ClassifierError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ClassifierError::ModelLoad(format!("Not a model archive: {}", e)))?;

    let manifest_bytes = read_entry(&mut archive, MANIFEST_ENTRY)?;
    let manifest: Manifest = from_json(&manifest_bytes, MANIFEST_ENTRY)?;
    if manifest.metadata.format_version != FORMAT_VERSION {
        return Err(ClassifierError::ModelLoad(format!(
            "Unsupported model format version {} (this build reads version {})",
            manifest.metadata.format_version, FORMAT_VERSION
        )));
    }

    let labels_bytes = read_verified(&mut archive, &manifest, LABELS_ENTRY)?;
    let featurizer_bytes = read_verified(&mut archive, &manifest, FEATURIZER_ENTRY)?;
    let booster_bytes = read_verified(&mut archive, &manifest, BOOSTER_ENTRY)?;

    let labels: LabelVocabulary = from_json(&labels_bytes, LABELS_ENTRY)?;
    let featurizer: TextFeaturizer = from_json(&featurizer_bytes, FEATURIZER_ENTRY)?;
    let booster: BoostedTreeClassifier = from_json(&booster_bytes, BOOSTER_ENTRY)?;

    let metadata = &manifest.metadata;
    for (what, expected, found) in [
        ("labels", metadata.class_count, labels.len()),
        ("classifier classes", metadata.class_count, booster.num_classes()),
        ("featurizer terms", metadata.feature_count, featurizer.dimension()),
        ("classifier features", metadata.feature_count, booster.feature_size()),
    ] {
        if expected != found {
            error!("Artifact manifest expects {} {}, found {}", expected, what, found);
            return Err(ClassifierError::ModelLoad(format!(
                "Manifest expects {} {}, artifact holds {}",
                expected, what, found
            )));
        }
    }

    Ok(Model::from_parts(labels, featurizer, booster, manifest.metadata))
}

/// Writes `model` to `path` through `store`, replacing any existing artifact.
pub fn save<S: ModelStore + ?Sized>(store: &S, model: &Model, path: &Path) -> Result<(), ClassifierError> {
    let bytes = encode(model)?;
    store.write(path, &bytes).map_err(|e| {
        error!("Failed to write model to {:?}: {}", path, e);
        ClassifierError::Io(e)
    })?;
    info!("Model written to {:?} ({} bytes)", path, bytes.len());
    Ok(())
}

/// Reads and decodes the artifact at `path` through `store`.
///
/// # Errors
/// - `ModelLoad` if the file cannot be read or decoded
pub fn load<S: ModelStore + ?Sized>(store: &S, path: &Path) -> Result<Model, ClassifierError> {
    let bytes = store.read(path).map_err(|e| {
        error!("Failed to read model from {:?}: {}", path, e);
        ClassifierError::ModelLoad(format!("Cannot read model file {}: {}", path.display(), e))
    })?;
    let model = decode(&bytes)?;
    info!(
        "Model loaded from {:?}: {} classes, {} features, created {}",
        path,
        model.metadata.class_count,
        model.metadata.feature_count,
        model.metadata.created_at
    );
    Ok(model)
}
