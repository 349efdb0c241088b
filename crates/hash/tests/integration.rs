//! Integration tests for hash crate

#[cfg(test)]
mod tests {
    use depot_errors::{Error, VerifyError};
    use depot_hash::*;
    use tempfile::tempdir;
    use tokio::fs;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_hash_file_matches_in_memory_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("artifact.bin");

        // Spans several read chunks with a ragged tail
        let data: Vec<u8> = (0..200_003u32).map(|i| (i % 251) as u8).collect();
        let mut file = fs::File::create(&path).await.unwrap();
        file.write_all(&data).await.unwrap();
        file.shutdown().await.unwrap();

        let from_file = Md5Digest::hash_file(&path).await.unwrap();
        assert_eq!(from_file, Md5Digest::from_data(&data));

        let (streamed, bytes) = Md5Digest::hash_reader(fs::File::open(&path).await.unwrap())
            .await
            .unwrap();
        assert_eq!(streamed, from_file);
        assert_eq!(bytes, data.len() as u64);
    }

    #[tokio::test]
    async fn test_missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.bin");
        match Md5Digest::hash_file(&path).await.unwrap_err() {
            Error::Io { path: Some(p), .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_hex_round_trip_and_rejection() {
        let digest = Md5Digest::from_data(b"");
        assert_eq!(digest.to_hex(), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            Md5Digest::from_hex("D41D8CD98F00B204E9800998ECF8427E").unwrap(),
            digest
        );

        for bad in ["", "d41d8cd9", "zz1d8cd98f00b204e9800998ecf8427e"] {
            assert!(matches!(
                Md5Digest::from_hex(bad),
                Err(Error::Verify(VerifyError::Io { .. }))
            ));
        }
    }
}
