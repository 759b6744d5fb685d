//! End-to-end transaction flow over in-memory connections.

use consent_core::{harness::run_transaction_flow, TransactionDetails};

#[tokio::test]
async fn test_transaction_flow() {
    let details = TransactionDetails::new("{ bankingDetails { iban bank } }")
        .titled("Mortgage", "Income verification")
        .under_law("GDPR art. 6(1)(b)");

    let content = run_transaction_flow(&details)
        .await
        .expect("transaction flow should succeed");

    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["bankingDetails"]["iban"], "NL91ABNA0417164300");
}
