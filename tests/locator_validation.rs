//! Property tests for hierarchical locator validation

use privacy_graph::{DocumentPath, Locator};
use proptest::prelude::*;

fn segments(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}", 0..max)
}

proptest! {
    /// Single-document locators need exactly one id per collection
    #[test]
    fn single_document_needs_matching_ids(path in segments(6), ids in segments(7)) {
        let valid = !path.is_empty() && ids.len() == path.len();
        let locator = Locator::single("record", DocumentPath::new(path, ids));
        prop_assert_eq!(locator.validate().is_ok(), valid);
    }

    /// Collection locators need one id fewer than collections
    #[test]
    fn collection_needs_one_id_fewer(path in segments(6), ids in segments(7)) {
        let valid = !path.is_empty() && ids.len() + 1 == path.len();
        let locator = Locator::many("record", DocumentPath::new(path, ids));
        prop_assert_eq!(locator.validate().is_ok(), valid);
    }

    /// Narrowing a valid collection locator yields a valid single-document locator
    #[test]
    fn narrowed_collection_is_single(path in segments(5), id in "[a-z0-9]{1,12}") {
        prop_assume!(!path.is_empty());
        let parent_ids: Vec<String> = path.iter().skip(1).map(|p| format!("{}-id", p)).collect();
        let locator = Locator::many("record", DocumentPath::new(path, parent_ids));
        prop_assert!(locator.validate().is_ok());

        let narrowed = locator.narrow(&id);
        prop_assert!(narrowed.single_document);
        prop_assert!(narrowed.validate().is_ok());
        prop_assert_eq!(narrowed.address.doc_ids.last(), Some(&id));
    }
}

#[test]
fn documented_examples() {
    assert!(Locator::single("user", DocumentPath::new(["users"], ["u1"])).validate().is_ok());
    assert!(Locator::many("groupChat", DocumentPath::new(["users", "gcs"], ["u1"])).validate().is_ok());
    assert!(Locator::many("user", DocumentPath::new(["users"], Vec::<String>::new())).validate().is_ok());
}
