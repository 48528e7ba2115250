//! Error specs
//!
//! Driver failures reach only the caller that caused them; startup failures
//! surface as initialization errors and never yield a usable connection.

use crate::prelude::*;

#[tokio::test]
async fn failed_request_does_not_disturb_the_next_one() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;
    setup.fake.fail_next(
        "commit",
        DriverError::new("serialization failure")
            .with_vendor_code(40)
            .with_sql_state("40001"),
    );

    let err = conn.commit().await.unwrap_err();
    match err {
        ConnectionError::Driver(e) => {
            assert_eq!(e.message, "serialization failure");
            assert_eq!(e.vendor_code, 40);
            assert_eq!(e.sql_state, "40001");
        }
        other => panic!("expected driver error, got {:?}", other),
    }

    assert_eq!(
        conn.get_table_schema(None, None, "users").await.unwrap(),
        users_schema()
    );
}

#[tokio::test]
async fn failed_stream_request_leaves_the_connection_unlocked() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;
    setup
        .fake
        .fail_next("get_objects", DriverError::new("catalog unavailable"));

    let err = conn
        .get_objects(ObjectsFilter::default().catalog("main"))
        .await
        .unwrap_err();
    assert!(err.is_driver());

    tokio::time::timeout(Duration::from_secs(5), conn.commit())
        .await
        .expect("connection locked after a failed stream request")
        .unwrap();
}

#[tokio::test]
async fn unknown_table_reports_driver_diagnostics() {
    let setup = Setup::new().await;
    let conn = setup.connect().await;

    let err = conn
        .get_table_schema(Some("main"), None, "nope")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("table not found: nope"));
    assert!(err.to_string().contains("sqlstate 42S02"));
}

#[tokio::test]
async fn registry_refusal_is_an_initialization_error() {
    let setup = Setup::new().await;
    let fake = FakeDriver::new();
    let registry = FakeRegistry::rejecting(
        &fake,
        RegistryError::Rejected("database is read-only".to_string()),
    );

    let result = Connection::start(
        Arc::new(fake.clone()),
        &registry,
        ConnectionConfig::new("refused"),
    )
    .await;

    match result {
        Err(ConnectionError::Initialization(InitializationError::Attach(reason))) => {
            assert!(reason.to_string().contains("database is read-only"));
        }
        other => panic!("expected initialization error, got {:?}", other.map(|c| c.id().to_string())),
    }
    assert_eq!(fake.count("connection_release"), 1);
    assert_eq!(fake.count("connection_init"), 0);
    assert!(setup.work_calls().is_empty());
}

#[tokio::test]
async fn attaching_to_an_uninitialized_database_fails_startup() {
    let fake = FakeDriver::new();
    let driver = Arc::new(TracedDriver::new(fake.clone()));
    let database = Database::new(Arc::clone(&driver)).unwrap();

    let err = Connection::start(Arc::clone(&driver), &database, ConnectionConfig::new("early"))
        .await
        .unwrap_err();

    assert!(err.is_initialization());
    assert!(matches!(
        err,
        ConnectionError::Initialization(InitializationError::Attach(RegistryError::Misuse(
            MisuseError::DatabaseNotInitialized
        )))
    ));
    assert_eq!(fake.count("connection_release"), 1);
}

#[tokio::test]
async fn connection_create_failure_is_an_initialization_error() {
    let setup = Setup::new().await;
    setup
        .fake
        .fail_next("connection_new", DriverError::new("too many handles"));

    let err = setup
        .connect_with(ConnectionConfig::new("none"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ConnectionError::Initialization(InitializationError::Create(_))
    ));
    assert_eq!(setup.fake.count("connection_release"), 0);
}
