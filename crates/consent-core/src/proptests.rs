#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use consent_crypto::Key32;
    use proptest::prelude::*;

    use crate::query::parse_query;
    use crate::queue::TransactionQueue;
    use crate::types::{CollectionData, Entry};

    fn selection_set() -> impl Strategy<Value = BTreeMap<String, BTreeSet<String>>> {
        prop::collection::btree_map(
            "c[a-zA-Z0-9_]{0,10}",
            prop::collection::btree_set("x[a-zA-Z0-9_]{0,10}", 1..5),
            1..5,
        )
    }

    fn render(selection: &BTreeMap<String, BTreeSet<String>>) -> String {
        let mut query = String::from("{");
        for (collection, fields) in selection {
            query.push_str(&format!(
                " {} {{ {} }}",
                collection,
                fields.iter().cloned().collect::<Vec<_>>().join(" ")
            ));
        }
        query.push_str(" }");
        query
    }

    proptest! {
        #[test]
        fn prop_parse_recovers_selection(selection in selection_set()) {
            let parsed = parse_query(&render(&selection)).unwrap();
            let expected: Vec<CollectionData> = selection
                .into_iter()
                .map(|(structure, fields)| CollectionData {
                    structure,
                    fields: fields.into_iter().collect(),
                })
                .collect();
            prop_assert_eq!(parsed, expected);
        }

        #[test]
        fn prop_parse_never_panics(input in ".{0,128}") {
            let _ = parse_query(&input);
        }

        #[test]
        fn prop_queue_consumes_once(ids in prop::collection::vec(any::<[u8; 32]>(), 1..16)) {
            let queue = TransactionQueue::new();
            tokio_test::block_on(async {
                let mut fresh = BTreeSet::new();
                for id in &ids {
                    let entry = Entry {
                        transaction_id: Key32::new(*id),
                        requester_name: "ACME".into(),
                        requester_public_key: Key32::new([1; 32]),
                        signature_public_key: Key32::new([2; 32]),
                    };
                    let added = queue.add(entry).await.is_ok();
                    prop_assert_eq!(added, fresh.insert(*id));
                }
                for id in &fresh {
                    prop_assert!(queue.consume(&Key32::new(*id)).await.is_ok());
                    prop_assert!(queue.consume(&Key32::new(*id)).await.is_err());
                }
                prop_assert!(queue.is_empty().await);
                Ok(())
            })?;
        }
    }
}
