use crate::error::{Error, Result};
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::profile::ProfileFileCredentialsProvider;
use std::path::{Path, PathBuf};

/// Profile read from a credentials file when none is configured
pub const DEFAULT_PROFILE: &str = "default";

/// A profile in a shared credentials file
///
/// The file uses the INI layout of `~/.aws/credentials` and is parsed by the AWS SDK profile
/// provider when the first request needs credentials:
///
/// ```text
/// [default]
/// aws_access_key_id = AKIA...
/// aws_secret_access_key = ...
/// aws_session_token = ...   # optional
/// ```
#[derive(Debug, Clone)]
pub struct AwsCredential {
    path: PathBuf,
    profile: String,
}

impl AwsCredential {
    /// Selects `profile` from the credentials file at `path`
    ///
    /// # Errors
    ///
    /// [`Error::Credential`] if the file cannot be read. A missing or incomplete profile is
    /// reported by the first request.
    pub fn from_file(path: impl AsRef<Path>, profile: &str) -> Result<Self> {
        let path = path.as_ref();
        std::fs::File::open(path)
            .map_err(|e| Error::Credential(format!("unable to read {}: {}", path.display(), e)))?;

        if profile.is_empty() {
            return Err(Error::Credential(format!(
                "{}: profile name is empty",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            profile: profile.to_string(),
        })
    }

    /// The credentials file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The selected profile
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// SDK credentials provider reading only this file and profile
    pub(crate) fn provider(&self) -> ProfileFileCredentialsProvider {
        let files = ProfileFiles::builder()
            .with_file(ProfileFileKind::Credentials, &self.path)
            .build();

        ProfileFileCredentialsProvider::builder()
            .profile_files(files)
            .profile_name(&self.profile)
            .build()
    }
}
