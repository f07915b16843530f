use sqlx::PgPool;

/// Connect, migrate and verify every table is present.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    hms_db::health_check(&pool).await.unwrap();

    let tables = [
        "users",
        "user_sessions",
        "otp_codes",
        "rooms",
        "students",
        "complaints",
        "complaint_replies",
        "feedback",
        "fees",
        "fee_notifications",
        "attendance",
        "attendance_windows",
        "fingerprint_data",
        "leave_requests",
        "notices",
        "notification_states",
        "complaint_notifications",
        "notice_notifications",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// Room capacity outside 1..=12 is refused by the schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_room_capacity_check(pool: PgPool) {
    let result = sqlx::query(
        "INSERT INTO rooms (room_number, room_type, capacity) VALUES ('X1', 'Single', 0)",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err());
}
