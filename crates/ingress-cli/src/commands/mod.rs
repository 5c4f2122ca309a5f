//! CLI commands

use std::path::Path;

use ingress_common::Error;

pub mod extract;
pub mod keys;

/// Read a file, keeping the path in the error
pub(crate) fn read_file(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
}
