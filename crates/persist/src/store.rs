//! File-backed world persistence.
//!
//! Layout inside the store directory:
//! ```text
//! world.meta.json   - schema version, payload digest, save counter
//! world.cbor.zst    - CBOR+zstd compressed world snapshot
//! ```
//!
//! Both files are replaced atomically (write to `*.tmp`, then rename). The
//! payload is written before the metadata; a crash between the two leaves a
//! digest mismatch, which load refuses.

use crate::snapshot::Snapshot;
use crate::{StoreError, WorldPersistence};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tilescape_kernel::World;

/// Current world file schema version.
pub const WORLD_SCHEMA_VERSION: u32 = 1;

const META_FILE: &str = "world.meta.json";
const WORLD_FILE: &str = "world.cbor.zst";

/// Metadata stored in world.meta.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldMeta {
    pub schema_version: u32,
    /// SHA-256 of the compressed payload, hex encoded.
    pub sha256: String,
    pub state_hash: u64,
    /// Number of saves into this directory.
    pub save_count: u32,
}

/// World store rooted at a directory.
pub struct WorldStore {
    root: PathBuf,
}

impl WorldStore {
    /// Open (and create if needed) a store directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the world files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a saved world is present.
    pub fn exists(&self) -> bool {
        self.root.join(META_FILE).is_file()
    }

    /// Read and validate the metadata file.
    pub fn meta(&self) -> Result<WorldMeta, StoreError> {
        let path = self.root.join(META_FILE);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path));
            }
            Err(e) => return Err(e.into()),
        };
        let meta: WorldMeta = serde_json::from_reader(file)?;
        if meta.schema_version != WORLD_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                file_version: meta.schema_version,
                expected_version: WORLD_SCHEMA_VERSION,
            });
        }
        Ok(meta)
    }

    /// Check the payload digest without decoding the world.
    pub fn verify_integrity(&self) -> Result<(), StoreError> {
        let meta = self.meta()?;
        let data = fs::read(self.root.join(WORLD_FILE))?;
        check_digest(&meta, &data)
    }
}

impl WorldPersistence for WorldStore {
    fn save(&mut self, world: &World) -> Result<(), StoreError> {
        let save_count = match self.meta() {
            Ok(meta) => meta.save_count + 1,
            Err(StoreError::NotFound(_)) => 1,
            Err(e) => return Err(e),
        };

        let snap = Snapshot::capture(world);
        let compressed = zstd_compress(&cbor_serialize(&snap)?)?;
        let meta = WorldMeta {
            schema_version: WORLD_SCHEMA_VERSION,
            sha256: sha256_hex(&compressed),
            state_hash: snap.state_hash,
            save_count,
        };

        write_bytes_atomic(&self.root.join(WORLD_FILE), &compressed)?;
        write_bytes_atomic(
            &self.root.join(META_FILE),
            &serde_json::to_vec_pretty(&meta)?,
        )?;
        tracing::info!(
            path = %self.root.display(),
            bytes = compressed.len(),
            save_count,
            "world saved"
        );
        Ok(())
    }

    fn load(&self) -> Result<World, StoreError> {
        let meta = self.meta()?;
        let compressed = fs::read(self.root.join(WORLD_FILE))?;
        check_digest(&meta, &compressed)?;

        let snap: Snapshot = cbor_deserialize(&zstd_decompress(&compressed)?)?;
        snap.world.check_consistency()?;
        if !snap.verify() || snap.state_hash != meta.state_hash {
            return Err(StoreError::IntegrityMismatch {
                expected: format!("{:016x}", meta.state_hash),
                actual: format!("{:016x}", snap.world.state_hash()),
            });
        }
        let world = snap.restore();
        tracing::info!(
            path = %self.root.display(),
            chunks = world.chunk_count(),
            entities = world.entity_count(),
            "world loaded"
        );
        Ok(world)
    }
}

fn check_digest(meta: &WorldMeta, data: &[u8]) -> Result<(), StoreError> {
    let actual = sha256_hex(data);
    if actual != meta.sha256 {
        return Err(StoreError::IntegrityMismatch {
            expected: meta.sha256.clone(),
            actual,
        });
    }
    Ok(())
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

pub(crate) fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::CborEncode(e.to_string()))?;
    Ok(buf)
}

pub(crate) fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, StoreError> {
    ciborium::from_reader(data).map_err(|e| StoreError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
