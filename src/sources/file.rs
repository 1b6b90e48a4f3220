//! The backing file: existence guarantee, reading and writing.

use super::Properties;
use crate::error::{ConfigError, Result};
use std::fs::{self, Metadata, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A properties file on disk.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_props::sources::PropertiesFile;
///
/// # fn example() -> hotswap_props::error::Result<()> {
/// let file = PropertiesFile::new("config/app.properties");
/// file.ensure()?;
/// let props = file.read()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PropertiesFile {
    path: PathBuf,
}

impl PropertiesFile {
    /// Bind to the file at `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file's path, exactly as given.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the path currently exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Guarantee a usable file exists at the path.
    ///
    /// A missing path is created as an empty regular file. An existing path
    /// must be a regular, readable and writable file that is not a symbolic
    /// link; it is never modified by this check. Calling this on a valid file
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidConfigPath`] if the existing path is unusable
    /// - [`ConfigError::IoError`] if the file cannot be created
    pub fn ensure(&self) -> Result<()> {
        match fs::symlink_metadata(&self.path) {
            Ok(meta) => self.check_usable(&meta),
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.create_empty(),
            Err(e) => Err(ConfigError::io(&self.path, e)),
        }
    }

    fn create_empty(&self) -> Result<()> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => {
                debug!(path = %self.path.display(), "Created configuration file");
                Ok(())
            }
            // Someone else created it first; validate what is there now.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let meta =
                    fs::symlink_metadata(&self.path).map_err(|e| ConfigError::io(&self.path, e))?;
                self.check_usable(&meta)
            }
            Err(e) => Err(ConfigError::io(&self.path, e)),
        }
    }

    fn check_usable(&self, meta: &Metadata) -> Result<()> {
        if meta.file_type().is_symlink() {
            return Err(ConfigError::invalid_path(&self.path, "path is a symbolic link"));
        }
        if !meta.is_file() {
            return Err(ConfigError::invalid_path(&self.path, "path is not a regular file"));
        }
        if meta.permissions().readonly() {
            return Err(ConfigError::invalid_path(&self.path, "file is not writable"));
        }

        // Opening without truncate or create leaves the file untouched.
        match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(
                ConfigError::invalid_path(&self.path, "file is not readable and writable"),
            ),
            Err(e) => Err(ConfigError::io(&self.path, e)),
        }
    }

    /// Read and parse the whole file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a parse error if it
    /// is not valid UTF-8 or contains a malformed escape.
    pub fn read(&self) -> Result<Properties> {
        let bytes = fs::read(&self.path).map_err(|e| ConfigError::io(&self.path, e))?;
        let text = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            ConfigError::ParseError {
                line,
                message: "file is not valid UTF-8".to_string(),
            }
        })?;
        Properties::parse(&text)
    }

    /// Overwrite the file with `contents`.
    ///
    /// The file is never created by this call. With `atomic`, the contents go
    /// to a temporary file in the same directory which then replaces the
    /// original, keeping its permissions.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ConfigFileMissing`] if the file does not exist
    /// - [`ConfigError::IoError`] if writing fails
    pub fn write(&self, contents: &str, atomic: bool) -> Result<()> {
        if atomic {
            self.write_atomic(contents)
        } else {
            self.write_in_place(contents)
        }
    }

    fn write_in_place(&self, contents: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| self.missing_or_io(e))?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| ConfigError::io(&self.path, e))
    }

    fn write_atomic(&self, contents: &str) -> Result<()> {
        let permissions = fs::metadata(&self.path)
            .map_err(|e| self.missing_or_io(e))?
            .permissions();

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ConfigError::io(dir, e))?;
        tmp.write_all(contents.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .and_then(|()| tmp.as_file().set_permissions(permissions))
            .map_err(|e| ConfigError::io(tmp.path(), e))?;

        tmp.persist(&self.path)
            .map_err(|e| ConfigError::io(&self.path, e.error))?;
        Ok(())
    }

    fn missing_or_io(&self, e: io::Error) -> ConfigError {
        if e.kind() == io::ErrorKind::NotFound {
            ConfigError::ConfigFileMissing(self.path.clone())
        } else {
            ConfigError::io(&self.path, e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.properties");

        let file = PropertiesFile::new(&path);
        assert!(!file.exists());
        file.ensure().unwrap();

        assert!(file.exists());
        assert!(fs::metadata(&path).unwrap().is_file());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.properties");
        fs::write(&path, "name=Alice\n").unwrap();

        let file = PropertiesFile::new(&path);
        file.ensure().unwrap();
        file.ensure().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "name=Alice\n");
    }

    #[test]
    fn test_ensure_rejects_directory() {
        let temp_dir = TempDir::new().unwrap();
        let err = PropertiesFile::new(temp_dir.path()).ensure().unwrap_err();
        assert!(err.is_invalid_path());
        assert!(temp_dir.path().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_rejects_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("real.properties");
        let link = temp_dir.path().join("link.properties");
        fs::write(&target, "k=v\n").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let err = PropertiesFile::new(&link).ensure().unwrap_err();
        assert!(err.is_invalid_path());
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&target).unwrap(), "k=v\n");
    }

    #[test]
    fn test_ensure_rejects_readonly_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("readonly.properties");
        fs::write(&path, "k=v\n").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms).unwrap();

        let err = PropertiesFile::new(&path).ensure().unwrap_err();
        assert!(err.is_invalid_path());
    }

    #[test]
    fn test_ensure_missing_parent_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("app.properties");

        let err = PropertiesFile::new(&path).ensure().unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_read_parses_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.properties");
        fs::write(&path, "# header\nname=Alice\n").unwrap();

        let props = PropertiesFile::new(&path).read().unwrap();
        assert_eq!(props.get("name"), Some("Alice"));
    }

    #[test]
    fn test_read_invalid_utf8_reports_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.properties");
        fs::write(&path, b"a=1\nb=\xff\n").unwrap();

        match PropertiesFile::new(&path).read().unwrap_err() {
            ConfigError::ParseError { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_write_overwrites_in_full() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.properties");
        fs::write(&path, "a=1\nb=2\nc=3\n").unwrap();

        let file = PropertiesFile::new(&path);
        file.write("a=9\n", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a=9\n");

        file.write("b=8\n", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "b=8\n");
    }

    #[test]
    fn test_write_never_creates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.properties");
        let file = PropertiesFile::new(&path);

        for atomic in [false, true] {
            let err = file.write("a=1\n", atomic).unwrap_err();
            assert!(matches!(err, ConfigError::ConfigFileMissing(_)));
            assert!(!path.exists());
        }
    }
}
