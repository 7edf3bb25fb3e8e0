//! Artifact Path Codec - the single mapping between combinations and storage paths
//!
//! ## Layout
//!
//! ```text
//! <root>/<topic_count>/<prior>/<random_seed>/<passes>/<iterations>/model
//! ```
//!
//! The grid search writes through [`ArtifactPathCodec::encode`] and the
//! coherence pass reads through [`ArtifactPathCodec::decode`]; nothing else
//! builds artifact paths.

use std::path::{Component, Path, PathBuf};

use super::{HyperparameterCombination, PriorMode};
use crate::{Error, Result};

/// File name of every persisted model.
pub const ARTIFACT_FILE_NAME: &str = "model";

/// Segments below the root: five hyperparameters plus the file name.
const SEGMENT_COUNT: usize = 6;

/// Bidirectional path codec anchored at a storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPathCodec {
    root: PathBuf,
}

impl ArtifactPathCodec {
    /// Create a codec for the given storage root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the artifact for a combination.
    #[must_use]
    pub fn directory(&self, combination: &HyperparameterCombination) -> PathBuf {
        self.root
            .join(combination.topic_count().to_string())
            .join(combination.prior().as_str())
            .join(combination.random_seed().to_string())
            .join(combination.passes().to_string())
            .join(combination.iterations().to_string())
    }

    /// Artifact path for a combination.
    #[must_use]
    pub fn encode(&self, combination: &HyperparameterCombination) -> PathBuf {
        self.directory(combination).join(ARTIFACT_FILE_NAME)
    }

    /// Recover the combination from an artifact path.
    ///
    /// # Errors
    ///
    /// Returns `PathDecode` if the path is outside the root, does not have
    /// exactly six segments below it, does not end in the artifact file name,
    /// or holds a segment that does not parse.
    pub fn decode(&self, path: &Path) -> Result<HyperparameterCombination> {
        let fail = |reason: String| Error::PathDecode {
            path: path.to_path_buf(),
            reason,
        };

        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| fail(format!("not under root {}", self.root.display())))?;

        let segments = relative
            .components()
            .map(|component| match component {
                Component::Normal(segment) => segment
                    .to_str()
                    .ok_or_else(|| fail("segment is not valid UTF-8".to_string())),
                other => Err(fail(format!("unexpected path component {other:?}"))),
            })
            .collect::<Result<Vec<&str>>>()?;

        if segments.len() != SEGMENT_COUNT {
            return Err(fail(format!(
                "expected {SEGMENT_COUNT} segments below root, found {}",
                segments.len()
            )));
        }
        if segments[5] != ARTIFACT_FILE_NAME {
            return Err(fail(format!(
                "expected file name '{ARTIFACT_FILE_NAME}', found '{}'",
                segments[5]
            )));
        }

        let topic_count = parse_segment::<u32>(segments[0], "topic count").map_err(&fail)?;
        let prior = segments[1]
            .parse::<PriorMode>()
            .map_err(|e| fail(e.to_string()))?;
        let random_seed = parse_segment::<u64>(segments[2], "random seed").map_err(&fail)?;
        let passes = parse_segment::<u32>(segments[3], "pass count").map_err(&fail)?;
        let iterations = parse_segment::<u32>(segments[4], "iteration cap").map_err(&fail)?;

        HyperparameterCombination::new(topic_count, prior, random_seed, passes, iterations)
            .map_err(|e| fail(e.to_string()))
    }
}

fn parse_segment<T: std::str::FromStr>(segment: &str, field: &str) -> std::result::Result<T, String> {
    // Reject "+5" and "05" so that decode stays the exact inverse of encode.
    let canonical = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if !canonical {
        return Err(format!("{field} segment '{segment}' is not a canonical integer"));
    }
    segment
        .parse::<T>()
        .map_err(|_| format!("{field} segment '{segment}' is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combo(k: u32, seed: u64, passes: u32) -> HyperparameterCombination {
        HyperparameterCombination::new(k, PriorMode::Auto, seed, passes, 200).unwrap()
    }

    #[test]
    fn test_encode_layout() {
        let codec = ArtifactPathCodec::new("root");
        let path = codec.encode(&combo(2, 42, 5));
        assert_eq!(path, PathBuf::from("root/2/auto/42/5/200/model"));
    }

    #[test]
    fn test_decode_inverse() {
        let codec = ArtifactPathCodec::new("/data/models");
        let c = combo(17, 99, 20);
        assert_eq!(codec.decode(&codec.encode(&c)).unwrap(), c);
    }

    #[test]
    fn test_decode_rejects_short_path() {
        let codec = ArtifactPathCodec::new("root");
        let err = codec.decode(Path::new("root/2/auto/42/5/model")).unwrap_err();
        assert!(matches!(err, Error::PathDecode { .. }));
        assert!(format!("{err}").contains("expected 6 segments"));
    }

    #[test]
    fn test_decode_rejects_long_path() {
        let codec = ArtifactPathCodec::new("root");
        let err = codec
            .decode(Path::new("root/extra/2/auto/42/5/200/model"))
            .unwrap_err();
        assert!(matches!(err, Error::PathDecode { .. }));
    }

    #[test]
    fn test_decode_rejects_wrong_file_name() {
        let codec = ArtifactPathCodec::new("root");
        let err = codec.decode(Path::new("root/2/auto/42/5/200/lda.model")).unwrap_err();
        assert!(format!("{err}").contains("file name"));
    }

    #[test]
    fn test_decode_rejects_bad_segments() {
        let codec = ArtifactPathCodec::new("root");
        for bad in [
            "root/two/auto/42/5/200/model",
            "root/2/dirichlet/42/5/200/model",
            "root/2/auto/-1/5/200/model",
            "root/02/auto/42/5/200/model",
            "root/0/auto/42/5/200/model",
        ] {
            assert!(codec.decode(Path::new(bad)).is_err(), "{bad} should not decode");
        }
    }

    #[test]
    fn test_decode_rejects_outside_root() {
        let codec = ArtifactPathCodec::new("root");
        assert!(codec.decode(Path::new("other/2/auto/42/5/200/model")).is_err());
    }
}
