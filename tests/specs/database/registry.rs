//! Database specs
//!
//! A database is configured, initialized, shared by its connections and
//! released exactly once.

use crate::prelude::*;

#[tokio::test]
async fn connections_attach_to_the_shared_database() {
    let setup = Setup::new().await;
    let _first = setup.connect().await;
    let _second = setup.connect().await;

    let attached: Vec<_> = setup
        .fake
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            DriverCall::ConnectionInit { database, .. } => Some(database),
            _ => None,
        })
        .collect();
    assert_eq!(attached.len(), 2);
    assert!(attached.iter().all(|id| *id == attached[0]));
}

#[tokio::test]
async fn database_release_twice_is_a_misuse() {
    let setup = Setup::new().await;

    setup.database.release().await.unwrap();
    let err = setup.database.release().await.unwrap_err();

    assert!(matches!(
        err,
        DatabaseError::Misuse(MisuseError::DatabaseReleased)
    ));
    assert_eq!(setup.fake.count("database_release"), 1);
}

#[tokio::test]
async fn released_database_refuses_new_connections() {
    let setup = Setup::new().await;
    setup.database.release().await.unwrap();

    let err = setup
        .connect_with(ConnectionConfig::new("late"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ConnectionError::Initialization(InitializationError::Attach(RegistryError::Misuse(
            MisuseError::DatabaseReleased
        )))
    ));
    assert_eq!(setup.fake.count("connection_release"), 1);
}

#[tokio::test]
async fn open_connections_keep_working_after_a_failed_option() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;
    setup
        .fake
        .fail_next("connection_set_option", DriverError::new("read-only option"));

    assert!(conn.set_option("adbc.connection.readonly", "false").await.unwrap_err().is_driver());
    conn.set_option("adbc.connection.autocommit", "true").await.unwrap();
}
