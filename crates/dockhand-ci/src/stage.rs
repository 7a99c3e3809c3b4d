//! Build stage definitions.

use serde::{Deserialize, Serialize};

/// Step output carrying the derived tag of the [`StageRole::TestEnv`] stage.
pub const TESTENV_TAG_OUTPUT: &str = "testenv-tag";

/// Step output carrying the derived tag of the [`StageRole::Server`] stage.
pub const SERVER_TAG_OUTPUT: &str = "server-tag";

/// Role of a stage within the pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StageRole {
    /// Built and pushed, no output.
    Generic,

    /// Test environment; its derived tag is published as [`TESTENV_TAG_OUTPUT`].
    TestEnv,

    /// Server image; its derived tag is published as [`SERVER_TAG_OUTPUT`].
    Server,
}

/// A named Dockerfile target and the remote tag it is pushed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stage {
    /// Dockerfile target name; also the local cache-seed tag.
    pub name: String,

    /// `{repository}/{name}`
    pub tag: String,

    pub role: StageRole,
}

impl Stage {
    pub fn new(repository: &str, name: &str, role: StageRole) -> Self {
        Self {
            name: name.to_string(),
            tag: image_tag(repository, name),
            role,
        }
    }

    pub fn generic(repository: &str, name: &str) -> Self {
        Self::new(repository, name, StageRole::Generic)
    }
}

/// Remote tag for a stage: `{repository}/{stage}`.
pub fn image_tag(repository: &str, stage: &str) -> String {
    format!("{repository}/{stage}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_tag_is_repository_slash_stage() {
        assert_eq!(image_tag("acme/app", "base"), "acme/app/base");
        assert_eq!(
            image_tag("ghcr.io/acme/app", "server"),
            "ghcr.io/acme/app/server"
        );
    }

    #[test]
    fn test_image_tag_for_many_names() {
        for repository in ["r", "acme/app", "registry:5000/x"] {
            for stage in ["a", "deps", "test-env", "v2_build"] {
                let tag = image_tag(repository, stage);
                assert_eq!(tag, format!("{}/{}", repository, stage));
                assert!(tag.ends_with(stage));
                assert!(tag.starts_with(repository));
            }
        }
    }

    #[test]
    fn test_stage_new() {
        let stage = Stage::new("acme/app", "test", StageRole::TestEnv);
        assert_eq!(stage.name, "test");
        assert_eq!(stage.tag, "acme/app/test");
        assert_eq!(stage.role, StageRole::TestEnv);

        let base = Stage::generic("acme/app", "base");
        assert_eq!(base.role, StageRole::Generic);
    }
}
