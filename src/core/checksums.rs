//! `SHA512SUMS.txt` handling: `<hex digest>  <file name>` per line, the
//! format `sha512sum` reads and writes.

use crate::utils::error::{Result, ToolkitError};
use sha2::{Digest, Sha512};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const CHECKSUM_FILE: &str = "SHA512SUMS.txt";

/// SHA-512 of a file, as lowercase hex.
pub fn sha512_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha512::new();
    let mut buffer = vec![0u8; 1 << 20];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// [`sha512_file`] on tokio's blocking pool, for raw files of several GB.
pub async fn sha512_file_async(path: PathBuf) -> Result<String> {
    tokio::task::spawn_blocking(move || sha512_file(&path))
        .await
        .map_err(|e| ToolkitError::IoError(std::io::Error::other(e)))?
}

/// Parses checksum lines. Blank and malformed lines are skipped; a leading
/// `*` (binary mode marker) on the file name is ignored.
pub fn parse_checksums(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| {
            let (digest, name) = line.trim().split_once(char::is_whitespace)?;
            let name = name.trim_start().trim_start_matches('*');
            (!digest.is_empty() && !name.is_empty())
                .then(|| (name.to_string(), digest.to_lowercase()))
        })
        .collect()
}

/// Reads `dir/SHA512SUMS.txt`; an absent file yields an empty map.
pub fn read_checksums(dir: &Path) -> Result<HashMap<String, String>> {
    let path = dir.join(CHECKSUM_FILE);
    if !path.exists() {
        return Ok(HashMap::new());
    }
    Ok(parse_checksums(&std::fs::read_to_string(path)?))
}

/// Writes the checksums of `order` that are known, in that order.
pub fn write_checksums(dir: &Path, order: &[&str], checksums: &HashMap<String, String>) -> Result<usize> {
    let mut content = String::new();
    let mut written = 0;
    for name in order {
        if let Some(digest) = checksums.get(*name) {
            content.push_str(&format!("{}  {}\n", digest, name));
            written += 1;
        }
    }
    std::fs::write(dir.join(CHECKSUM_FILE), content)?;
    Ok(written)
}
