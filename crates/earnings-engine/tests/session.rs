use std::sync::Arc;

use chrono::{TimeZone, Utc};
use earnings_engine::{
    FixedClock, LedgerAnalytics, LedgerOptions, LedgerStore, MemoryLedgerStore, Period, Session, StandardPeriod,
};

const MARCH: &str = r#"{
    "metadata": { "userName": "March Agency", "utcOffset": "-07:00", "operationalStatus": true, "platformFee": 0.25 },
    "transactions": [
        { "id": "m1", "timestamp": "2025-03-14T08:00:00", "channel": "messages", "creatorAlias": "@ivy", "amount": 40 },
        { "id": "m2", "timestamp": "2025-03-13T22:00:00", "channel": "tips", "creatorAlias": "@mae", "amount": 60 }
    ]
}"#;

const BROKEN: &str = r#"{ "metadata": { "userName": "x" }, "transactions": [] }"#;

fn session() -> Session {
    // 2025-03-14 12:00 at -07:00
    let now = Utc.with_ymd_and_hms(2025, 3, 14, 19, 0, 0).unwrap();
    Session::new(Arc::new(FixedClock(now)), LedgerOptions::default())
}

#[tokio::test]
async fn loads_named_ledger_from_store() {
    let store = MemoryLedgerStore::new();
    store.save("march.json", MARCH).await.unwrap();

    let mut session = session();
    assert!(session.load_from(&store, "march.json").await.unwrap());
    assert_eq!(session.ledger_name(), Some("march.json"));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.metadata.user_name, "March Agency");
    assert_eq!(snapshot.earnings_data[&StandardPeriod::Today].gross.messages, 40.0);
    assert_eq!(snapshot.earnings_data[&StandardPeriod::Yesterday].gross.tips, 60.0);
    assert_eq!(snapshot.earnings_data[&StandardPeriod::Today].net.total, 30.0);
    assert_eq!(snapshot.statistics.creators, 2);
    assert_eq!(snapshot.statistics.message_earnings, 40.0);
}

#[tokio::test]
async fn missing_ledger_keeps_empty_state() {
    let store = MemoryLedgerStore::new();
    let mut session = session();
    assert!(!session.load_from(&store, "nope.json").await.unwrap());
    assert!(!session.is_loaded());
    assert_eq!(session.snapshot().metadata.user_name, "No Data");
}

#[tokio::test]
async fn invalid_ledger_keeps_previous_state() {
    let store = MemoryLedgerStore::new();
    store.save("march.json", MARCH).await.unwrap();
    store.save("broken.json", BROKEN).await.unwrap();

    let mut session = session();
    session.load_from(&store, "march.json").await.unwrap();

    let err = session.load_from(&store, "broken.json").await.unwrap_err();
    assert!(format!("{:#}", err).contains("metadata.utcOffset"));
    assert_eq!(session.ledger_name(), Some("march.json"));
    assert_eq!(session.snapshot().metadata.user_name, "March Agency");
}

#[tokio::test]
async fn session_queries_delegate_to_engine() {
    let store = MemoryLedgerStore::new();
    store.save("march.json", MARCH).await.unwrap();
    let mut session = session();

    let range = Period::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap(),
    );
    assert_eq!(session.calculate_earnings_for_period(range, None).gross, 0.0);

    session.load_from(&store, "march.json").await.unwrap();
    let totals = session.calculate_earnings_for_period(range, None);
    assert_eq!(totals.gross, 100.0);
    assert_eq!(totals.platform_fees, 25.0);
    assert_eq!(session.calculate_creator_earnings("@ivy", range, None).gross, 40.0);
}
