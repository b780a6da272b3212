use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// The last IP address that was successfully published. This survives
/// restarts, so that privddns does not re-publish an unchanged address every
/// time it starts, and it is the cursor a failed publish is retried from.
///
/// On disk it is a single text file holding the address and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastIpStore {
    path: PathBuf,
}

impl LastIpStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored address, or an empty string if nothing has been
    /// stored yet.
    pub fn read(&self) -> io::Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(s.trim().to_owned()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    /// Replaces the stored address. The new contents go to a temporary file
    /// next to the target which is then renamed over it, so readers see
    /// either the old address or the new one.
    pub fn write(&self, ip: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.temp_path();

        let result = File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(ip.as_bytes())?;
                file.sync_all()
            })
            .and_then(|_| fs::rename(&tmp, &self.path));

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }

        result
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastIpStore::new(dir.path().join("last_ip"));

        assert_eq!(store.read().unwrap(), "");
        assert!(!store.path().exists());
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastIpStore::new(dir.path().join("nested/data/last_ip"));

        store.write("192.0.2.10").unwrap();
        assert_eq!(store.read().unwrap(), "192.0.2.10");

        store.write("2001:db8::10").unwrap();
        assert_eq!(store.read().unwrap(), "2001:db8::10");
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "2001:db8::10");
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_ip");
        fs::write(&path, "  198.51.100.3\n").unwrap();

        assert_eq!(LastIpStore::new(&path).read().unwrap(), "198.51.100.3");
    }

    #[test]
    fn unreadable_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be cannot be read as text.
        let store = LastIpStore::new(dir.path());

        assert!(store.read().is_err());
    }
}
