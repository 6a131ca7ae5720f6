// Credential persistence. A single (email, api_key) pair is stored per API
// host in a JSON file under the user's home directory. Access is not
// guarded: the CLI assumes one user running one command at a time.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub email: String,
    pub api_key: String,
}

/// Storage for the active credential.
pub trait CredentialStore {
    fn save(&self, email: &str, api_key: &str) -> Result<()>;
    fn get(&self) -> Result<Option<Credential>>;
    fn delete(&self) -> Result<()>;
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct CredentialFile {
    #[serde(default)]
    hosts: BTreeMap<String, Credential>,
}

/// File-backed store scoped to one API host. Entries for other hosts in the
/// same file are left untouched.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    host: String,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>, host: &str) -> Self {
        FileCredentialStore {
            path: path.into(),
            host: host.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CredentialFile> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CredentialFile::default()),
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(CredentialFile::default());
        }
        serde_json::from_str(&data).map_err(|e| Error::Credentials {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Load for a write. A malformed file is replaced rather than blocking
    /// a fresh login; the flag says whether that happened.
    fn load_for_write(&self) -> Result<(CredentialFile, bool)> {
        match self.load() {
            Ok(file) => Ok((file, false)),
            Err(Error::Credentials { path, reason }) => {
                tracing::warn!(path = %path.display(), %reason, "replacing malformed credential file");
                Ok((CredentialFile::default(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn store(&self, file: &CredentialFile) -> Result<()> {
        if file.hosts.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(file)?;
        std::fs::write(&self.path, data)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, email: &str, api_key: &str) -> Result<()> {
        let (mut file, _) = self.load_for_write()?;
        file.hosts.insert(
            self.host.clone(),
            Credential {
                email: email.to_string(),
                api_key: api_key.to_string(),
            },
        );
        self.store(&file)?;
        tracing::debug!(path = %self.path.display(), host = %self.host, "saved credentials");
        Ok(())
    }

    fn get(&self) -> Result<Option<Credential>> {
        Ok(self.load()?.hosts.remove(&self.host))
    }

    fn delete(&self) -> Result<()> {
        let (mut file, reset) = self.load_for_write()?;
        if file.hosts.remove(&self.host).is_some() || reset {
            self.store(&file)?;
            tracing::debug!(path = %self.path.display(), host = %self.host, "deleted credentials");
        }
        Ok(())
    }
}
