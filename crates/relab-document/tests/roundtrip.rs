//! Property tests for the serialization compatibility surface

use proptest::prelude::*;
use relab_document::{assemble, Cell, Document, FixRecord};

fn arb_source() -> impl Strategy<Value = String> {
    // printable text with embedded newlines, including empty sources
    proptest::collection::vec("[ -~]{0,40}", 0..6).prop_map(|lines| lines.join("\n"))
}

fn arb_cell() -> impl Strategy<Value = Cell> {
    prop_oneof![
        arb_source().prop_map(|s| Cell::narrative(&s)),
        arb_source().prop_map(|s| Cell::executable(&s)),
    ]
}

fn arb_document() -> impl Strategy<Value = Document> {
    proptest::collection::vec(arb_cell(), 0..8).prop_map(assemble)
}

proptest! {
    #[test]
    fn round_trip_preserves_document(doc in arb_document()) {
        let bytes = doc.to_bytes().unwrap();
        let back = Document::from_bytes(&bytes).unwrap();
        prop_assert_eq!(doc, back);
    }

    #[test]
    fn patch_changes_only_target(doc in arb_document(), source in arb_source()) {
        prop_assume!(!doc.is_empty());
        let target = source.len() % doc.len();

        let mut patched = doc.clone();
        patched.apply_fix(&FixRecord::single(target, source.clone())).unwrap();

        prop_assert_eq!(patched.cells[target].source().as_text(), source);
        prop_assert_eq!(patched.cells[target].kind(), doc.cells[target].kind());
        for (i, cell) in doc.cells.iter().enumerate() {
            if i != target {
                prop_assert_eq!(&patched.cells[i], cell);
            }
        }
    }
}
