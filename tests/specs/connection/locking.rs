//! Stream lock specs
//!
//! A streaming request locks its connection until the caller hands back the
//! unlock token; nothing else touches the driver meanwhile.

use crate::prelude::*;

#[tokio::test]
async fn queued_request_waits_for_the_stream_holder_to_release() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;

    let lease = conn.get_info(vec![0, 1]).await.unwrap();
    assert_eq!(lease.stream().rows, vec!["info:0", "info:1"]);

    let schema = tokio::spawn({
        let conn = conn.clone();
        async move { conn.get_table_schema(None, None, "users").await }
    });
    settle().await;
    assert!(!schema.is_finished());
    assert_eq!(setup.fake.count("get_table_schema"), 0);

    conn.release(lease.into_token()).await.unwrap();

    assert_eq!(schema.await.unwrap().unwrap(), users_schema());
    assert_eq!(setup.work_calls(), vec!["get_info", "get_table_schema"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn driver_never_sees_two_calls_at_once() {
    let setup = Setup::with_driver(
        FakeDriver::new()
            .with_table("users", "id: int64")
            .with_call_delay(Duration::from_millis(2)),
    )
    .await;
    let conn = setup.connect().await;

    let mut callers = Vec::new();
    for i in 0..12 {
        let conn = conn.clone();
        callers.push(tokio::spawn(async move {
            if i % 3 == 0 {
                let lease = conn.get_table_types().await?;
                tokio::time::sleep(Duration::from_millis(3)).await;
                conn.release(lease.into_token()).await
            } else if i % 3 == 1 {
                conn.get_table_schema(None, None, "users").await.map(|_| ())
            } else {
                conn.commit().await
            }
        }));
    }
    for caller in callers {
        caller.await.unwrap().unwrap();
    }

    assert_eq!(setup.fake.max_concurrent_calls(), 1);
    assert_eq!(setup.work_calls().len(), 12);
}

#[tokio::test]
async fn token_from_another_connection_is_rejected() {
    let setup = Setup::new().await;
    let first = setup.connect().await;
    let second = setup.connect().await;

    let mine = second.get_table_types().await.unwrap();
    let (_stream, theirs) = first.get_table_types().await.unwrap().into_parts();

    let err = second.release(theirs).await.unwrap_err();
    let theirs = match err {
        ConnectionError::TokenRejected {
            reason: MisuseError::ForeignToken { owner, connection },
            token,
        } => {
            assert_eq!(owner, first.id());
            assert_eq!(connection, second.id());
            token
        }
        other => panic!("expected foreign token rejection, got {:?}", other),
    };

    // Both connections stay locked by their own leases
    let first_waiting = tokio::spawn({
        let first = first.clone();
        async move { first.commit().await }
    });
    let second_waiting = tokio::spawn({
        let second = second.clone();
        async move { second.commit().await }
    });
    settle().await;
    assert!(!first_waiting.is_finished());
    assert!(!second_waiting.is_finished());

    first.release(theirs).await.unwrap();
    first_waiting.await.unwrap().unwrap();
    assert!(!second_waiting.is_finished());

    second.release(mine.into_token()).await.unwrap();
    second_waiting.await.unwrap().unwrap();
}

#[tokio::test]
async fn slow_consumer_is_reported_but_keeps_its_lock() {
    let setup = Setup::new().await;
    let config = ConnectionConfig::new("slow")
        .with_stale_after(Duration::from_millis(20))
        .with_stale_check_interval(Duration::from_millis(5));
    let conn = setup.connect_with(config).await.unwrap();

    let lease = conn.get_table_types().await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    let waiting = tokio::spawn({
        let conn = conn.clone();
        async move { conn.commit().await }
    });
    settle().await;
    assert!(!waiting.is_finished());

    conn.release(lease.into_token()).await.unwrap();
    waiting.await.unwrap().unwrap();
}
