use std::collections::BTreeSet;

use audiofolder::generate::{resolve_activation, Activation, DropFlags};
use audiofolder::labels::{infer_labels, LabelVocabulary};
use audiofolder::FileRef;
use proptest::prelude::*;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn labels_are_sorted_distinct_parent_directories(media in proptest_helpers::arb_grouped_media(24)) {
        let files: Vec<FileRef> = media.iter().map(|seed| seed.to_file_ref()).collect();
        let labels = infer_labels(&files).expect("grouped media is inferable");

        let expected: Vec<String> = media
            .iter()
            .map(|seed| seed.enclosing().expect("grouped").to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        prop_assert_eq!(labels.vocabulary().names(), expected.as_slice());

        for (position, seed) in media.iter().enumerate() {
            let code = labels.code_at(position).expect("code per file");
            prop_assert_eq!(labels.vocabulary().name(code), seed.enclosing());
        }
    }

    #[test]
    fn any_root_level_file_disables_labels(media in proptest_helpers::arb_media_with_root_file(16)) {
        let files: Vec<FileRef> = media.iter().map(|seed| seed.to_file_ref()).collect();
        prop_assert!(infer_labels(&files).is_none());
    }

    #[test]
    fn label_inference_is_order_independent_in_vocabulary(media in proptest_helpers::arb_grouped_media(16)) {
        let forward: Vec<FileRef> = media.iter().map(|seed| seed.to_file_ref()).collect();
        let backward: Vec<FileRef> = forward.iter().rev().cloned().collect();

        let left = infer_labels(&forward).expect("inferable");
        let right = infer_labels(&backward).expect("inferable");
        prop_assert_eq!(left.vocabulary(), right.vocabulary());

        let reversed: Vec<usize> = right.codes().iter().rev().copied().collect();
        prop_assert_eq!(left.codes(), reversed.as_slice());
    }

    #[test]
    fn vocabulary_codes_round_trip(names in proptest::collection::vec("[a-z]{1,6}", 0..12)) {
        let vocabulary = LabelVocabulary::from_names(names.iter().cloned());
        for name in &names {
            let code = vocabulary.code(name).expect("known name");
            prop_assert_eq!(vocabulary.name(code), Some(name.as_str()));
        }
        prop_assert!(vocabulary.names().windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn activation_follows_flag_and_availability(
        drop_metadata in proptest_helpers::drop_flag_strategy(),
        drop_labels in proptest_helpers::drop_flag_strategy(),
        has_metadata in any::<bool>(),
        labels_inferable in any::<bool>(),
    ) {
        let activation = Activation::decide(
            DropFlags { drop_metadata, drop_labels },
            has_metadata,
            labels_inferable,
        );
        prop_assert_eq!(activation.add_metadata, has_metadata && drop_metadata != Some(true));
        prop_assert_eq!(activation.add_labels, labels_inferable && drop_labels != Some(true));
        prop_assert_eq!(activation.add_labels, resolve_activation(drop_labels, labels_inferable));
    }
}
