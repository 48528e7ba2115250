//! Connection lifecycle specs
//!
//! Startup attaches the native connection or fails cleanly; release happens
//! once, in queue order, and shutdown never leaks the native handle.

use crate::prelude::*;

#[tokio::test]
async fn startup_applies_options_before_attaching() {
    let setup = Setup::new().await;
    let config = ConnectionConfig::new("etl")
        .with_option("adbc.connection.autocommit", "false")
        .with_option("adbc.connection.readonly", "true");

    let _conn = setup.connect_with(config).await.unwrap();

    let calls: Vec<_> = setup
        .fake
        .calls()
        .into_iter()
        .filter(|call| call.connection().is_some())
        .map(|call| call.name())
        .collect();
    assert_eq!(
        calls,
        vec![
            "connection_new",
            "connection_set_option",
            "connection_set_option",
            "connection_init"
        ]
    );
}

#[tokio::test]
async fn second_release_is_a_misuse_not_a_driver_error() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;

    conn.release_connection().await.unwrap();
    let err = conn.release_connection().await.unwrap_err();

    assert!(err.is_misuse());
    assert!(!err.is_driver());
    assert!(matches!(
        err,
        ConnectionError::Misuse(MisuseError::ConnectionReleased)
    ));
    assert_eq!(setup.fake.count("connection_release"), 1);
}

#[tokio::test]
async fn requests_queued_before_release_still_run() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;
    let lease = conn.get_table_types().await.unwrap();

    let commit = tokio::spawn({
        let conn = conn.clone();
        async move { conn.commit().await }
    });
    settle().await;
    let close = tokio::spawn({
        let conn = conn.clone();
        async move { conn.release_connection().await }
    });
    settle().await;
    let late = tokio::spawn({
        let conn = conn.clone();
        async move { conn.rollback().await }
    });
    settle().await;

    conn.release(lease.into_token()).await.unwrap();

    commit.await.unwrap().unwrap();
    close.await.unwrap().unwrap();
    assert!(matches!(
        late.await.unwrap(),
        Err(ConnectionError::Misuse(MisuseError::ConnectionReleased))
    ));
    assert_eq!(setup.fake.count("rollback"), 0);
}

#[tokio::test]
async fn operations_after_release_fail_with_misuse() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;
    conn.release_connection().await.unwrap();

    assert!(conn.get_table_types().await.unwrap_err().is_misuse());
    assert!(conn
        .get_objects(ObjectsFilter::default())
        .await
        .unwrap_err()
        .is_misuse());
    assert!(conn.set_option("k", "v").await.unwrap_err().is_misuse());
    assert!(setup.work_calls().is_empty());
}

#[tokio::test]
async fn dropping_every_handle_releases_the_native_connection() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;
    let other = conn.clone();
    conn.commit().await.unwrap();

    drop(conn);
    settle().await;
    assert_eq!(setup.fake.count("connection_release"), 0);

    drop(other);
    setup.wait_for_calls("connection_release", 1).await;
}

#[tokio::test]
async fn shutdown_after_explicit_release_does_not_release_again() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;
    conn.release_connection().await.unwrap();

    drop(conn);
    settle().await;

    assert_eq!(setup.fake.count("connection_release"), 1);
}

#[tokio::test]
async fn request_timeout_gives_up_on_a_locked_connection() {
    let setup = Setup::new().await;
    let conn = setup
        .connect_with(ConnectionConfig::new("impatient").with_request_timeout(Duration::from_millis(40)))
        .await
        .unwrap();

    let lease = conn.get_table_types().await.unwrap();
    let err = conn.get_table_schema(None, None, "users").await.unwrap_err();
    assert!(matches!(
        err,
        ConnectionError::Timeout {
            command: "get_table_schema",
            ..
        }
    ));

    conn.release(lease.into_token()).await.unwrap();
    conn.commit().await.unwrap();
}
