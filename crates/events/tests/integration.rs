//! Integration tests for events

#[cfg(test)]
mod tests {
    use depot_errors::{Error, VerifyError};
    use depot_events::*;

    /// A component that may or may not have a listener attached
    struct Worker {
        events: Option<EventSender>,
    }

    impl EventEmitter for Worker {
        fn event_sender(&self) -> Option<&EventSender> {
            self.events.as_ref()
        }
    }

    #[tokio::test]
    async fn test_emitter_on_component() {
        let (tx, mut rx) = channel();
        let worker = Worker { events: Some(tx) };

        worker.emit(AppEvent::Archive(ArchiveEvent::Started {
            destination: "/tmp/out".into(),
        }));
        worker.emit_debug("scanning entries");

        assert!(matches!(
            rx.recv().await.unwrap(),
            AppEvent::Archive(ArchiveEvent::Started { .. })
        ));
        match rx.recv().await.unwrap() {
            AppEvent::General(GeneralEvent::DebugLog { message, .. }) => {
                assert_eq!(message, "scanning entries");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_failure_event_round_trips_through_json() {
        let err: Error = VerifyError::ChecksumMismatch {
            filename: "app.tar.gz".into(),
            expected: "aa".into(),
            actual: "bb".into(),
        }
        .into();
        let event = AppEvent::Download(DownloadEvent::Failed {
            url: "http://depot.test/packages/app/download".into(),
            failure: FailureContext::from_error(&err),
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: AppEvent = serde_json::from_str(&json).unwrap();
        match back {
            AppEvent::Download(DownloadEvent::Failed { failure, .. }) => {
                assert_eq!(failure.code.as_deref(), Some("verify.checksum_mismatch"));
                assert!(!failure.retryable);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_log_event_handles_every_domain() {
        let events = [
            AppEvent::General(GeneralEvent::warning("low disk")),
            AppEvent::Catalog(CatalogEvent::Resolved {
                product: "app".into(),
                version: "1.0.0".into(),
                hash: "abc".into(),
            }),
            AppEvent::Download(DownloadEvent::VerificationCompleted {
                filename: "app.tar".into(),
                digest: String::new(),
                skipped: true,
            }),
            AppEvent::Archive(ArchiveEvent::EntrySkipped {
                path: "dev/fifo".into(),
                kind: "fifo".into(),
            }),
        ];
        for event in &events {
            log_event(event);
        }
    }
}
