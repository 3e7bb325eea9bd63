/// JSON episode-length manifests loaded from disk.
pub mod manifest;
