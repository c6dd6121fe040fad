//! Upload handling configuration.

use serde::{Deserialize, Serialize};

/// Limits and processing options for uploaded images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Root directory for stored files, served at `/uploads`.
    #[serde(default = "default_root")]
    pub root: String,
    /// Maximum size of a single file in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Maximum number of files per request.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Longest edge after downscaling, in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// JPEG re-encode quality (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl UploadsConfig {
    /// The request body limit for multipart uploads.
    pub fn body_limit(&self) -> usize {
        let per_file = usize::try_from(self.max_file_size_bytes).unwrap_or(usize::MAX);
        per_file
            .saturating_mul(self.max_files.max(1))
            .saturating_add(1024 * 1024)
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_file_size_bytes: default_max_file_size(),
            max_files: default_max_files(),
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_root() -> String {
    "./uploads".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_max_files() -> usize {
    10
}

fn default_max_dimension() -> u32 {
    1920
}

fn default_jpeg_quality() -> u8 {
    80
}
