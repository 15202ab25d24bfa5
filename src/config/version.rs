use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;

/// Compute a deterministic fingerprint for a configuration file based on its content.
///
/// The same config file always produces the same fingerprint, so the value
/// logged at session start identifies exactly which configuration produced a
/// given telemetry stream.
pub fn config_fingerprint(config_path: &Path) -> Result<String, io::Error> {
    let content = std::fs::read_to_string(config_path)?;
    Ok(fingerprint_str(&content))
}

/// Fingerprint of an already-loaded YAML string.
pub fn fingerprint_str(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    // First 8 bytes are plenty for identification
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}
