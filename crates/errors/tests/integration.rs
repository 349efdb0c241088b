//! Integration tests for error types

#[cfg(test)]
mod tests {
    use depot_errors::*;

    #[test]
    fn test_error_conversion() {
        let err: Error = CatalogError::NoBuilds {
            product: "editor".into(),
        }
        .into();
        assert!(matches!(err, Error::Catalog(CatalogError::NoBuilds { .. })));
        assert_eq!(err.to_string(), "catalog error: no builds available for editor");
    }

    #[test]
    fn test_auth_failure_hint() {
        let err: Error = CatalogError::Status {
            product: "editor".into(),
            status: 401,
            body: "Server says: 401 Unauthorized".into(),
        }
        .into();
        assert_eq!(err.user_hint(), Some("Check that your API key is valid."));
        assert_eq!(err.user_code(), Some("catalog.status"));
        assert!(!err.is_retryable());
        assert!(err.user_message().contains("401 Unauthorized"));
    }

    #[test]
    fn test_unsafe_archive_codes() {
        let traversal: Error = ArchiveError::PathTraversal {
            entry: "../../etc/passwd".into(),
        }
        .into();
        let link: Error = ArchiveError::UnsafeLinkTarget {
            entry: "lib/link".into(),
            target: "/etc/shadow".into(),
        }
        .into();
        assert_eq!(traversal.user_code(), Some("archive.path_traversal"));
        assert_eq!(link.user_code(), Some("archive.unsafe_link"));
        assert!(traversal.user_hint().is_some());
        assert!(traversal.to_string().contains("../../etc/passwd"));
    }

    #[test]
    fn test_resume_rejection_message() {
        let err: Error = TransferError::ResumeRejected {
            offset: 1024,
            status: 200,
        }
        .into();
        let message = err.to_string();
        assert!(message.contains("1024"), "{message}");
        assert!(message.contains("200"), "{message}");
    }

    #[test]
    fn test_errors_are_clone() {
        let err: Error = ConfigError::InvalidValue {
            field: "service.base_url".into(),
            value: "::".into(),
        }
        .into();
        assert_eq!(err.clone().to_string(), err.to_string());
    }
}
