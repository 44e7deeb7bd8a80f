//! On-disk leadfield container.
//!
//! ```text
//! [Header]
//! - Magic: "TILF" (4 bytes)
//! - Version: u32 LE (4 bytes)
//! - Digest: SHA-256 of the payload (32 bytes)
//! [Payload]
//! - bincode-serialized LeadfieldMatrix
//! ```

use super::LeadfieldMatrix;
use crate::error::LoadError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

pub const MAGIC: &[u8; 4] = b"TILF";
pub const FORMAT_VERSION: u32 = 1;

pub fn save_leadfield<P: AsRef<Path>>(path: P, matrix: &LeadfieldMatrix) -> Result<(), LoadError> {
    let payload = bincode::serialize(matrix).map_err(|e| LoadError::Decode(e.to_string()))?;
    let digest = Sha256::digest(&payload);

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(MAGIC)?;
    out.write_all(&FORMAT_VERSION.to_le_bytes())?;
    out.write_all(&digest)?;
    out.write_all(&payload)?;
    out.flush()?;
    Ok(())
}

/// Reads and validates a container. Any structural problem is a [`LoadError`].
pub fn load_leadfield<P: AsRef<Path>>(path: P) -> Result<LeadfieldMatrix, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    info!("📂 Loading Leadfield: {}", path.display());
    let mut rdr = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 4];
    read_header_field(&mut rdr, &mut magic)?;
    if &magic != MAGIC {
        return Err(LoadError::InvalidMagic(magic));
    }

    let mut version = [0u8; 4];
    read_header_field(&mut rdr, &mut version)?;
    let version = u32::from_le_bytes(version);
    if version != FORMAT_VERSION {
        return Err(LoadError::VersionMismatch {
            found: version,
            expected: FORMAT_VERSION,
        });
    }

    let mut expected_digest = [0u8; 32];
    read_header_field(&mut rdr, &mut expected_digest)?;

    let mut payload = Vec::new();
    rdr.read_to_end(&mut payload)?;

    let digest = Sha256::digest(&payload);
    if digest.as_slice() != expected_digest.as_slice() {
        return Err(LoadError::ChecksumMismatch);
    }
    debug!("Leadfield payload sha256 {}", hex::encode(digest));

    let matrix: LeadfieldMatrix =
        bincode::deserialize(&payload).map_err(|e| LoadError::Decode(e.to_string()))?;
    matrix.validate()?;

    info!(
        "   -> {} electrodes (+ reference '{}'), {} elements",
        matrix.n_electrodes(),
        matrix.reference_electrode,
        matrix.n_elements
    );
    Ok(matrix)
}

fn read_header_field<R: Read>(rdr: &mut R, buf: &mut [u8]) -> Result<(), LoadError> {
    rdr.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => LoadError::Shape("truncated header".to_string()),
        _ => LoadError::Io(e),
    })
}
