//! Persisted layout of a run's outputs.
//!
//! ```text
//! <folder>/
//! ├── <flavor>.json               combined results
//! ├── <flavor>_input.csv          combined echoed input
//! ├── config.json                 unchunked run only
//! └── chunks/
//!     ├── <flavor>_<pid>.json
//!     ├── <flavor>_input_<pid>.csv
//!     └── config_<pid>.json
//! ```

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::Flavor;

const CHUNKS_DIR: &str = "chunks";

/// Joins two `/`-separated location segments.
pub fn join_path(base: &str, child: &str) -> String {
    let child = child.trim_start_matches('/');
    if base.is_empty() {
        return child.to_owned();
    }
    format!("{}/{}", base.trim_end_matches('/'), child)
}

/// Returns the location one level above `path`, or an empty string at the root.
pub fn parent_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Logical output artifact produced by every worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactKind {
    /// Scraped results, JSON.
    Results,
    /// The worker's input chunk echoed back, headerless CSV.
    EchoedInput,
}

impl ArtifactKind {
    /// Kinds in the order they are combined.
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Results, ArtifactKind::EchoedInput];

    /// File extension, including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Results => ".json",
            Self::EchoedInput => ".csv",
        }
    }

    /// Base file name without extension, e.g. `portal` or `portal_input`.
    pub fn stem(self, flavor: Flavor) -> String {
        match self {
            Self::Results => flavor.to_string(),
            Self::EchoedInput => format!("{flavor}_input"),
        }
    }

    /// File name of the combined artifact.
    pub fn combined_file_name(self, flavor: Flavor) -> String {
        format!("{}{}", self.stem(flavor), self.extension())
    }

    /// File name of one chunk's artifact.
    pub fn chunk_file_name(self, flavor: Flavor, pid: usize) -> String {
        format!("{}_{pid}{}", self.stem(flavor), self.extension())
    }

    /// Parses the `pid` out of a chunk file name of this kind.
    ///
    /// Returns `None` for any name that is not exactly
    /// `<stem>_<digits><extension>`.
    pub fn parse_chunk_pid(self, flavor: Flavor, file_name: &str) -> Option<usize> {
        let digits = file_name
            .strip_prefix(&self.stem(flavor))?
            .strip_prefix('_')?
            .strip_suffix(self.extension())?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// Output folder of one run and the paths derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLayout {
    folder: String,
    flavor: Flavor,
}

impl OutputLayout {
    /// Creates a layout rooted at `folder`.
    pub fn new(folder: impl Into<String>, flavor: Flavor) -> Self {
        let folder = folder.into();
        Self {
            folder: folder.trim_end_matches('/').to_owned(),
            flavor,
        }
    }

    /// Default run folder: `<base>/results/<dataset>/<tag>`.
    pub fn default_folder(base: &str, dataset: &str, tag: &str) -> String {
        join_path(base, &format!("results/{dataset}/{tag}"))
    }

    /// Returns the run folder.
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Returns the flavor the layout names files after.
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Directory holding per-chunk artifacts.
    pub fn chunks_dir(&self) -> String {
        join_path(&self.folder, CHUNKS_DIR)
    }

    /// Path of an artifact; `chunk` is `None` for an unchunked run.
    pub fn artifact(&self, kind: ArtifactKind, chunk: Option<usize>) -> String {
        match chunk {
            None => join_path(&self.folder, &kind.combined_file_name(self.flavor)),
            Some(pid) => join_path(&self.chunks_dir(), &kind.chunk_file_name(self.flavor, pid)),
        }
    }

    /// Path of the echoed run configuration.
    pub fn config_file(&self, chunk: Option<usize>) -> String {
        match chunk {
            None => join_path(&self.folder, "config.json"),
            Some(pid) => join_path(&self.chunks_dir(), &format!("config_{pid}.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_and_unchunked_paths() {
        let layout = OutputLayout::new("results/ids/2024-05-01/", Flavor::Portal);
        assert_eq!(
            layout.artifact(ArtifactKind::Results, None),
            "results/ids/2024-05-01/portal.json"
        );
        assert_eq!(
            layout.artifact(ArtifactKind::EchoedInput, Some(3)),
            "results/ids/2024-05-01/chunks/portal_input_3.csv"
        );
        assert_eq!(layout.config_file(None), "results/ids/2024-05-01/config.json");
        assert_eq!(
            layout.config_file(Some(0)),
            "results/ids/2024-05-01/chunks/config_0.json"
        );
    }

    #[test]
    fn default_folder_with_remote_base() {
        assert_eq!(
            OutputLayout::default_folder("s3://bucket", "ids", "2024-05-01"),
            "s3://bucket/results/ids/2024-05-01"
        );
        assert_eq!(
            OutputLayout::default_folder("", "ids", "tag"),
            "results/ids/tag"
        );
    }

    #[test]
    fn parses_chunk_pids() {
        let flavor = Flavor::CourtSummary;
        let results = ArtifactKind::Results;
        let input = ArtifactKind::EchoedInput;

        assert_eq!(results.parse_chunk_pid(flavor, "court_summary_12.json"), Some(12));
        assert_eq!(input.parse_chunk_pid(flavor, "court_summary_input_0.csv"), Some(0));
        assert_eq!(results.parse_chunk_pid(flavor, "court_summary_input_0.csv"), None);
        assert_eq!(results.parse_chunk_pid(flavor, "court_summary_.json"), None);
        assert_eq!(results.parse_chunk_pid(flavor, "config_1.json"), None);
        assert_eq!(results.parse_chunk_pid(Flavor::Portal, "court_summary_1.json"), None);
    }

    #[test]
    fn parent_of_chunks_dir() {
        assert_eq!(parent_path("results/a/b/chunks/"), "results/a/b");
        assert_eq!(parent_path("chunks"), "");
    }
}
