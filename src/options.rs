use serde::Deserialize;

use crate::error::UploadRejected;

/// Upload gate applied to track files before they are parsed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackUploadLimits {
    /// Largest accepted file in bytes (default: 10 MiB)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Accepted file extensions without the dot, compared case-insensitively
    /// (default: ["gpx"])
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for TrackUploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            extensions: default_extensions(),
        }
    }
}

impl TrackUploadLimits {
    pub fn check(&self, file_name: &str, size: u64) -> Result<(), UploadRejected> {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)) {
            return Err(UploadRejected::Extension {
                file_name: file_name.to_string(),
                expected: self
                    .extensions
                    .iter()
                    .map(|e| format!(".{e}"))
                    .collect::<Vec<_>>()
                    .join(" or "),
            });
        }

        if size > self.max_bytes {
            return Err(UploadRejected::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        Ok(())
    }
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_extensions() -> Vec<String> {
    vec!["gpx".to_string()]
}
