//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    let version = flock_db::run_migrations(&db).await.unwrap();
    assert_eq!(version, flock_db::latest_version());

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    for table in [
        "organization",
        "volunteer",
        "serving_opportunity",
        "volunteer_shift",
        "volunteer_availability",
        "shift_slot",
        "_migration",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    flock_db::run_migrations(&db).await.unwrap();
    flock_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(
        records.len(),
        flock_db::latest_version() as usize,
        "each migration should be recorded exactly once"
    );
}

#[tokio::test]
async fn migration_resumes_after_recorded_version() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    db.query(flock_db::schema_v1())
        .await
        .unwrap()
        .check()
        .unwrap();
    db.query("CREATE _migration SET version = 1, name = 'initial_schema'")
        .await
        .unwrap()
        .check()
        .unwrap();

    let version = flock_db::run_migrations(&db).await.unwrap();
    assert_eq!(version, flock_db::latest_version());

    let mut result = db
        .query("SELECT VALUE version FROM _migration ORDER BY version ASC")
        .await
        .unwrap();
    let versions: Vec<u32> = result.take(0).unwrap();
    assert_eq!(versions, (1..=flock_db::latest_version()).collect::<Vec<_>>());
}

#[tokio::test]
async fn unknown_shift_status_is_rejected_by_schema() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    flock_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE volunteer_shift SET organization_id = 'o', volunteer_id = 'v', \
             opportunity_id = 'p', shift_date = '2025-06-01', \
             start_time = '09:00:00', end_time = '10:00:00', status = 'Maybe'",
        )
        .await
        .unwrap()
        .check();
    assert!(result.is_err());
}
