//! Tests for sequential code issuing and duplicate retries

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use core_kernel::{
    insert_with_code, DomainPort, PortError, SequenceKind, SequencePort, SequentialCode,
};

#[derive(Default)]
struct CountingSequences {
    counters: Mutex<HashMap<SequenceKind, u64>>,
}

impl DomainPort for CountingSequences {}

#[async_trait]
impl SequencePort for CountingSequences {
    async fn next_value(&self, kind: SequenceKind) -> Result<u64, PortError> {
        let mut counters = self.counters.lock().await;
        let value = counters.entry(kind).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}

#[tokio::test]
async fn test_issue_code_starts_at_one_per_kind() {
    let sequences = CountingSequences::default();

    let first_bill = sequences.issue_code(SequenceKind::Bill).await.unwrap();
    let second_bill = sequences.issue_code(SequenceKind::Bill).await.unwrap();
    let first_med = sequences.issue_code(SequenceKind::Medicine).await.unwrap();

    assert_eq!(first_bill.to_string(), "BILL001");
    assert_eq!(second_bill.to_string(), "BILL002");
    assert_eq!(first_med.to_string(), "MED001");
}

#[tokio::test]
async fn test_insert_with_code_retries_duplicates() {
    let sequences = CountingSequences::default();
    let attempts = AtomicU32::new(0);

    let code = insert_with_code(&sequences, SequenceKind::Bill, 3, |code: SequentialCode| {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt == 0 {
                Err(PortError::duplicate("bill", code))
            } else {
                Ok(code)
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(code.to_string(), "BILL002");
}

#[tokio::test]
async fn test_insert_with_code_gives_up_after_max_attempts() {
    let sequences = CountingSequences::default();
    let attempts = AtomicU32::new(0);

    let result: Result<(), PortError> =
        insert_with_code(&sequences, SequenceKind::Service, 3, |code| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async move { Err(PortError::duplicate("service", code)) }
        })
        .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(matches!(result, Err(PortError::Duplicate { .. })));
}

#[tokio::test]
async fn test_insert_with_code_does_not_retry_other_errors() {
    let sequences = CountingSequences::default();
    let attempts = AtomicU32::new(0);

    let result: Result<(), PortError> =
        insert_with_code(&sequences, SequenceKind::Patient, 3, |_code| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async move { Err(PortError::connection("store offline")) }
        })
        .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(result.unwrap_err().is_transient());
}

#[tokio::test]
async fn test_concurrent_issues_are_distinct() {
    let sequences = Arc::new(CountingSequences::default());

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let sequences = Arc::clone(&sequences);
            tokio::spawn(async move { sequences.issue_code(SequenceKind::Bill).await.unwrap() })
        })
        .collect();

    let mut codes = Vec::new();
    for handle in handles {
        codes.push(handle.await.unwrap().to_string());
    }
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 50);
}
