use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Value, json};

use hodl_gallery::error::GalleryError;
use hodl_gallery::nfd::{NFD_BATCH_SIZE, NfdClient, display_name, resolve_names};

struct FakeNfd {
    calls: Mutex<Vec<usize>>,
    fail_call: Option<usize>,
}

impl FakeNfd {
    fn new(fail_call: Option<usize>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_call,
        }
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

impl NfdClient for FakeNfd {
    async fn lookup_batch(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, Value>, GalleryError> {
        let call_index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(addresses.len());
            calls.len() - 1
        };
        if Some(call_index) == self.fail_call {
            return Err(GalleryError::NfdStatus {
                status: 500,
                message: "upstream unavailable".to_string(),
            });
        }
        Ok(addresses
            .iter()
            .map(|address| {
                (
                    address.clone(),
                    json!({"name": format!("{}.algo", address.to_lowercase())}),
                )
            })
            .collect())
    }
}

fn addresses(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("ADDR{i:02}")).collect()
}

#[tokio::test]
async fn batches_at_ten_addresses_per_call() {
    let client = FakeNfd::new(None);
    let input = addresses(25);

    let resolved = resolve_names(&client, &input).await;

    assert_eq!(client.batch_sizes(), [10, 10, 5]);
    assert_eq!(resolved.len(), 25);
    assert_eq!(
        display_name(&resolved["ADDR00"]),
        Some("addr00.algo")
    );
}

#[tokio::test]
async fn failed_batch_is_skipped_not_fatal() {
    let client = FakeNfd::new(Some(1));
    let input = addresses(25);

    let resolved = resolve_names(&client, &input).await;

    // All three batches were attempted.
    assert_eq!(client.batch_sizes(), [10, 10, 5]);
    // Batches 1 and 3 resolved; batch 2's addresses are absent, not errored.
    assert_eq!(resolved.len(), 15);
    assert!(resolved.contains_key("ADDR00"));
    assert!(resolved.contains_key("ADDR09"));
    assert!(!resolved.contains_key("ADDR10"));
    assert!(!resolved.contains_key("ADDR19"));
    assert!(resolved.contains_key("ADDR20"));
    assert!(resolved.contains_key("ADDR24"));
}

#[tokio::test]
async fn small_input_is_a_single_batch() {
    let client = FakeNfd::new(None);
    let input = addresses(NFD_BATCH_SIZE - 1);

    let resolved = resolve_names(&client, &input).await;
    assert_eq!(client.batch_sizes(), [9]);
    assert_eq!(resolved.len(), 9);
}

#[tokio::test]
async fn empty_input_makes_no_calls() {
    let client = FakeNfd::new(None);
    let resolved = resolve_names(&client, &[]).await;
    assert!(client.batch_sizes().is_empty());
    assert!(resolved.is_empty());
}
