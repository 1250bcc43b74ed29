//! Property-Based Testing for Linflow
//!
//! Coverage targets:
//! - Declaration canonicalization (chain/keys.rs)
//! - Adjacency contract checks (chain/linear.rs)
//! - Chain file parsing (ast/chain.rs)

use proptest::prelude::*;

// =============================================================================
// TEST 1: Canonicalization
// =============================================================================
// Target: src/chain/keys.rs
// Risk: every shape must fold to the same set of distinct keys

mod canonicalize_fuzzing {
    use super::*;
    use linflow::{canonicalize, Declaration, KeySet};
    use serde_json::{Map, Value};
    use std::collections::BTreeSet;

    prop_compose! {
        fn arb_keys()(keys in prop::collection::vec(r"[a-z][a-z0-9_]{0,8}", 0..12)) -> Vec<String> {
            keys
        }
    }

    proptest! {
        #[test]
        fn list_and_mapping_agree(keys in arb_keys()) {
            let list = canonicalize(Declaration::from(keys.clone()));
            let mapping: Map<String, Value> =
                keys.iter().map(|k| (k.clone(), Value::Null)).collect();
            let mapping = canonicalize(Declaration::Mapping(mapping));

            prop_assert_eq!(&list, &mapping);
        }

        #[test]
        fn list_drops_duplicates_only(keys in arb_keys()) {
            let distinct: BTreeSet<&str> = keys.iter().map(String::as_str).collect();
            let set = canonicalize(Declaration::from(keys.clone()));

            prop_assert_eq!(set.len(), distinct.len());
            for key in &keys {
                prop_assert!(set.contains(key));
            }
        }

        #[test]
        fn canonical_set_is_a_fixed_point(keys in arb_keys()) {
            let once: KeySet = canonicalize(Declaration::from(keys));
            let twice = canonicalize(Declaration::Set(once.clone()));
            prop_assert_eq!(once, twice);
        }
    }
}

// =============================================================================
// TEST 2: Adjacency contracts
// =============================================================================
// Target: src/chain/linear.rs
// Risk: add() must accept exactly when requires ⊆ predecessor's provides

mod contract_fuzzing {
    use super::*;
    use linflow::{KeySet, LinearChain, StaticTask};
    use std::sync::Arc;

    proptest! {
        #[test]
        fn add_accepts_iff_subset(
            provides in prop::collection::btree_set("[a-e]", 0..5),
            requires in prop::collection::btree_set("[a-e]", 0..5),
        ) {
            let provides: Vec<String> = provides.into_iter().collect();
            let requires: Vec<String> = requires.into_iter().collect();
            let provided: KeySet = provides.iter().cloned().collect();
            let required: KeySet = requires.iter().cloned().collect();

            let mut chain = LinearChain::new("fuzz");
            chain.add(Arc::new(StaticTask::new("a").provides(provides))).unwrap();
            let result = chain.add(Arc::new(StaticTask::new("b").requires(requires)));

            if required.is_subset(&provided) {
                prop_assert!(result.is_ok());
                prop_assert_eq!(chain.len(), 2);
            } else {
                let err = result.unwrap_err();
                prop_assert_eq!(err.missing, required.difference(&provided));
                prop_assert_eq!(chain.len(), 1);
            }
        }
    }
}

// =============================================================================
// TEST 3: Chain file parsing
// =============================================================================
// Target: src/ast/chain.rs
// Risk: arbitrary input must never panic

mod chain_file_fuzzing {
    use super::*;
    use linflow::ast::validate_task_id;
    use linflow::ChainFile;

    proptest! {
        #[test]
        fn from_yaml_never_panics(input in "[ -~\n]{0,200}") {
            let _ = ChainFile::from_yaml(&input);
        }

        #[test]
        fn valid_ids_accepted(id in r"[a-z][a-z0-9_-]{0,20}") {
            prop_assert!(validate_task_id(&id).is_ok());
        }

        #[test]
        fn ids_with_uppercase_start_rejected(id in r"[A-Z][a-z0-9_-]{0,20}") {
            prop_assert!(validate_task_id(&id).is_err());
        }
    }
}
