//! Whole-file persistence of the binary container.

use std::fs;
use std::path::Path;

use tracing::{info, instrument};

use crate::codec::{decode, encode, CodecConfig};
use crate::database::Database;
use crate::error::Error;
use crate::transform::PayloadTransform;

impl Database {
    /// Encode the database and write it to `path`, sealing the payload first
    /// when a transform is given.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save_to_file(
        &self,
        path: impl AsRef<Path>,
        transform: Option<&dyn PayloadTransform>,
    ) -> Result<(), Error> {
        self.save_to_file_with(path, transform, &CodecConfig::default())
    }

    /// Like [`Database::save_to_file`] with an explicit codec configuration.
    pub fn save_to_file_with(
        &self,
        path: impl AsRef<Path>,
        transform: Option<&dyn PayloadTransform>,
        config: &CodecConfig,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        let mut payload = encode(self, config)?;
        if let Some(transform) = transform {
            payload = transform.seal(payload)?;
        }
        fs::write(path, &payload)?;

        info!(
            path = %path.display(),
            bytes = payload.len(),
            sealed = transform.is_some(),
            "Saved database"
        );
        Ok(())
    }

    /// Read `path`, unseal it when a transform is given, and decode it.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_from_file(
        path: impl AsRef<Path>,
        transform: Option<&dyn PayloadTransform>,
        config: &CodecConfig,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        let mut payload = fs::read(path)?;
        let read = payload.len();
        if let Some(transform) = transform {
            payload = transform.open(payload)?;
        }
        let db = decode(&payload, config)?;

        info!(
            path = %path.display(),
            bytes = read,
            records = db.record_count(),
            "Loaded database"
        );
        Ok(db)
    }
}
