//! Request and response bodies of the package service endpoints

use crate::Build;
use serde::{Deserialize, Serialize};

/// Body of `GET /packages/{product}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBuildsResponse {
    pub builds: Vec<Build>,
}

/// Body of `GET /packages/{product}/download`: the selected build, serialized as-is
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct DownloadRequest<'a> {
    pub build: &'a Build,
}

impl<'a> DownloadRequest<'a> {
    #[must_use]
    pub fn new(build: &'a Build) -> Self {
        Self { build }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Artifact;

    #[test]
    fn test_download_request_serializes_build_fields_at_top_level() {
        let build = Build {
            version: "1.42.1".to_string(),
            date: "2025-05-01T00:00:00Z".parse().unwrap(),
            hash: "lastBuild".to_string(),
            artifacts: vec![Artifact {
                md5sum: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
                filename: "pkg.tar.gz".to_string(),
                name: "Package".to_string(),
            }],
            internal: false,
        };
        let value = serde_json::to_value(DownloadRequest::new(&build)).unwrap();
        assert_eq!(value["version"], "1.42.1");
        assert_eq!(value["hash"], "lastBuild");
        assert_eq!(value["artifacts"][0]["filename"], "pkg.tar.gz");
        assert_eq!(value["internal"], false);
    }

    #[test]
    fn test_list_builds_response_rejects_missing_builds_field() {
        assert!(serde_json::from_str::<ListBuildsResponse>(r#"{"items": []}"#).is_err());
        let empty: ListBuildsResponse = serde_json::from_str(r#"{"builds": []}"#).unwrap();
        assert!(empty.builds.is_empty());
    }
}
