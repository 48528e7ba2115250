//! Holder liveness specs
//!
//! A stream holder that goes away without releasing must not wedge the
//! connection: the lock frees itself and queued work resumes.

use crate::prelude::*;
use tokio::sync::oneshot;

#[tokio::test]
async fn crashed_holder_does_not_block_later_requests() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;

    let crashed = tokio::spawn({
        let conn = conn.clone();
        async move {
            let _lease = conn.get_info(vec![0]).await.unwrap();
            panic!("consumer crashed while reading the stream");
        }
    });
    assert!(crashed.await.unwrap_err().is_panic());

    let schema = tokio::time::timeout(
        Duration::from_secs(5),
        conn.get_table_schema(None, None, "users"),
    )
    .await
    .expect("connection stayed locked after the holder crashed")
    .unwrap();
    assert_eq!(schema, users_schema());
}

#[tokio::test]
async fn aborted_holder_unlocks_queued_requests() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;

    let (locked_tx, locked_rx) = oneshot::channel();
    let holder = tokio::spawn({
        let conn = conn.clone();
        async move {
            let _lease = conn.get_table_types().await.unwrap();
            let _ = locked_tx.send(());
            std::future::pending::<()>().await;
        }
    });
    locked_rx.await.unwrap();

    let waiting = tokio::spawn({
        let conn = conn.clone();
        async move { conn.commit().await }
    });
    settle().await;
    assert!(!waiting.is_finished());

    holder.abort();
    assert!(holder.await.unwrap_err().is_cancelled());

    tokio::time::timeout(Duration::from_secs(5), waiting)
        .await
        .expect("queued request never ran after the holder was aborted")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn dropped_lease_unlocks_even_if_the_stream_is_kept() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;

    let (stream, token) = conn.get_table_types().await.unwrap().into_parts();
    drop(token);

    conn.commit().await.unwrap();
    assert_eq!(stream.rows, vec!["TABLE", "VIEW"]);
}

#[tokio::test]
async fn each_lease_carries_its_own_token() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;

    let first = conn.get_table_types().await.unwrap();
    let first_lease = first.token().lease().clone();
    conn.release(first.into_token()).await.unwrap();

    let second = conn.get_table_types().await.unwrap();
    assert_ne!(second.token().lease(), &first_lease);
    assert_eq!(second.token().connection_id(), conn.id());
    conn.release(second.into_token()).await.unwrap();
    assert_eq!(setup.fake.count("get_table_types"), 2);
}
