//! Fiscal sequence issuance tests, including concurrent uniqueness.

mod common;

use common::test_db;

use colmado_db::EngineError;
use colmado_core::CoreError;

/// Numbers issue sequentially and format into full NCF codes.
#[tokio::test]
async fn issues_sequential_formatted_ncfs() {
    let (db, _dir) = test_db().await;
    db.fiscal()
        .create_sequence("company-1", "B02", None)
        .await
        .unwrap();

    let first = db.fiscal().next_ncf("company-1", "B02").await.unwrap();
    let second = db.fiscal().next_ncf("company-1", "B02").await.unwrap();

    assert_eq!(first.current_number, 1);
    assert_eq!(first.ncf, "B0200000001");
    assert_eq!(second.current_number, 2);
    assert_eq!(second.ncf, "B0200000002");

    let seq = db
        .fiscal()
        .get_sequence("company-1", "B02")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seq.current_number, 2);
}

/// An unconfigured doc type is unavailable.
#[tokio::test]
async fn unconfigured_doc_type_is_unavailable() {
    let (db, _dir) = test_db().await;

    let err = db.fiscal().next_ncf("company-1", "B15").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::NcfSequenceUnavailable { .. })
    ));
}

/// Issuance stops exactly at max_number.
#[tokio::test]
async fn exhausted_sequence_is_unavailable() {
    let (db, _dir) = test_db().await;
    db.fiscal()
        .create_sequence("company-1", "B01", Some(2))
        .await
        .unwrap();

    assert_eq!(
        db.fiscal().next_ncf("company-1", "B01").await.unwrap().current_number,
        1
    );
    assert_eq!(
        db.fiscal().next_ncf("company-1", "B01").await.unwrap().current_number,
        2
    );

    let err = db.fiscal().next_ncf("company-1", "B01").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::NcfSequenceUnavailable { .. })
    ));
}

/// N concurrent requests for the same doc type receive N distinct,
/// strictly increasing numbers - no duplicates, no gaps.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_issuance_never_duplicates() {
    let (db, _dir) = test_db().await;
    db.fiscal()
        .create_sequence("company-1", "B02", None)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.fiscal().next_ncf("company-1", "B02").await.unwrap()
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().current_number);
    }
    numbers.sort_unstable();

    assert_eq!(numbers, (1..=8).collect::<Vec<i64>>());
}
