//! Request ordering specs
//!
//! Requests reach the driver in the order they reached the connection,
//! regardless of which caller sent them.

use crate::prelude::*;

#[tokio::test]
async fn requests_from_three_callers_run_in_arrival_order() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;

    // Hold the connection so all three requests are queued before any runs
    let lease = conn.get_table_types().await.unwrap();

    let a = tokio::spawn({
        let conn = conn.clone();
        async move { conn.commit().await }
    });
    settle().await;
    let b = tokio::spawn({
        let conn = conn.clone();
        async move { conn.get_table_schema(None, None, "users").await }
    });
    settle().await;
    let c = tokio::spawn({
        let conn = conn.clone();
        async move { conn.rollback().await }
    });
    settle().await;

    conn.release(lease.into_token()).await.unwrap();

    a.await.unwrap().unwrap();
    assert_eq!(b.await.unwrap().unwrap(), users_schema());
    c.await.unwrap().unwrap();
    assert_eq!(
        setup.work_calls(),
        vec!["get_table_types", "commit", "get_table_schema", "rollback"]
    );
}

#[tokio::test]
async fn sequential_requests_from_one_caller_keep_their_order() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;

    for _ in 0..3 {
        conn.commit().await.unwrap();
        let lease = conn.get_info(vec![0]).await.unwrap();
        conn.release(lease.into_token()).await.unwrap();
        conn.rollback().await.unwrap();
    }

    assert_eq!(
        setup.work_calls(),
        ["commit", "get_info", "rollback"].repeat(3)
    );
}

#[tokio::test]
async fn connections_on_one_database_do_not_share_a_queue() {
    let setup = Setup::new().await;
    let first = setup.connect().await;
    let second = setup.connect().await;
    assert_ne!(first.id(), second.id());

    let lease = first.get_table_types().await.unwrap();

    // The second connection is not held up by the first one's lease
    second.commit().await.unwrap();

    first.release(lease.into_token()).await.unwrap();
}
