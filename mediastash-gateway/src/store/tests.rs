//! Contract tests for store backends

use super::*;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

/// Test helper to create a store
fn store() -> MemoryStore {
    MemoryStore::new()
}

/// Test helper for write-time metadata
fn metadata(content_type: &str, entries: &[(&str, &str)]) -> ObjectMetadata {
    let user_metadata: HashMap<String, String> = entries
        .iter()
        .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
        .collect();
    ObjectMetadata {
        content_type: Some(content_type.to_string()),
        user_metadata,
    }
}

// =============================================================================
// PUT / STAT
// =============================================================================

mod put_and_stat_tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_stat_round_trips() {
        let s = store();
        s.put_object(
            "downloads/abc123/clip.mp4",
            Bytes::from("frames"),
            metadata("video/mp4", &[("task-id", "abc123")]),
        )
        .await
        .unwrap();

        let stat = s.stat_object("downloads/abc123/clip.mp4").await.unwrap();
        assert_eq!(stat.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(stat.size, Some(6));
        assert!(stat.last_modified.is_some());
        assert_eq!(
            stat.user_metadata.get("task-id").map(String::as_str),
            Some("abc123")
        );
    }

    #[tokio::test]
    async fn test_stat_missing_key_is_no_such_key() {
        let s = store();
        let result = s.stat_object("downloads/abc123/ghost.mp4").await;
        assert!(matches!(result, Err(StoreError::NoSuchKey(_))));
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_object() {
        let s = store();
        let key = "downloads/abc123/clip.mp4";
        s.put_object(key, Bytes::from("first"), ObjectMetadata::default())
            .await
            .unwrap();
        s.put_object(key, Bytes::from("second"), ObjectMetadata::default())
            .await
            .unwrap();

        assert_eq!(s.len(), 1);
        assert_eq!(s.object_body(key).unwrap(), Bytes::from("second"));
    }

    #[tokio::test]
    async fn test_stat_without_metadata_reports_empty_map() {
        let s = store();
        s.put_object("k", Bytes::from("data"), ObjectMetadata::default())
            .await
            .unwrap();
        let stat = s.stat_object("k").await.unwrap();
        assert!(stat.user_metadata.is_empty());
        assert!(stat.content_type.is_none());
    }
}

// =============================================================================
// DELETE
// =============================================================================

mod delete_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_removes_object() {
        let s = store();
        s.put_object("k", Bytes::from("data"), ObjectMetadata::default())
            .await
            .unwrap();
        s.delete_object("k").await.unwrap();
        assert!(matches!(
            s.stat_object("k").await,
            Err(StoreError::NoSuchKey(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_absent_key_succeeds() {
        // Mirrors S3: DeleteObject reports success for keys that do not
        // exist.
        let s = store();
        s.delete_object("never-put").await.unwrap();
        s.delete_object("never-put").await.unwrap();
    }
}

// =============================================================================
// PRESIGN
// =============================================================================

mod presign_tests {
    use super::*;

    #[tokio::test]
    async fn test_presign_names_key_and_expiry() {
        let s = store();
        let url = s
            .presign_get("downloads/abc123/clip.mp4", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.contains("downloads/abc123/clip.mp4"));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[tokio::test]
    async fn test_presign_does_not_require_existence() {
        let s = store();
        let url = s
            .presign_get("downloads/abc123/ghost.mp4", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.contains("X-Amz-Expires=60"));
    }

    #[tokio::test]
    async fn test_presign_is_recomputed_per_call() {
        let s = store();
        let first = s.presign_get("k", Duration::from_secs(60)).await.unwrap();
        let second = s.presign_get("k", Duration::from_secs(120)).await.unwrap();
        assert_ne!(first, second);
    }
}

// =============================================================================
// LIST / HEALTH
// =============================================================================

mod list_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_filters_by_prefix() {
        let s = store();
        for key in [
            "downloads/abc123/a.mp4",
            "downloads/abc123/b.mp4",
            "downloads/other/c.mp4",
        ] {
            s.put_object(key, Bytes::from("data"), ObjectMetadata::default())
                .await
                .unwrap();
        }

        let keys = s.list_keys("downloads/abc123/").await.unwrap();
        assert_eq!(
            keys,
            vec![
                "downloads/abc123/a.mp4".to_string(),
                "downloads/abc123/b.mp4".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_empty_prefix_returns_everything_sorted() {
        let s = store();
        for key in ["b", "a", "c"] {
            s.put_object(key, Bytes::from("data"), ObjectMetadata::default())
                .await
                .unwrap();
        }
        let keys = s.list_keys("").await.unwrap();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_health_check_succeeds() {
        let s = store();
        s.health_check().await.unwrap();
    }
}
