use std::path::Path;

use proptest::prelude::*;
use romlink_core::paths::{sanitize, strip_foreign_volume};

fn hostile_path() -> impl Strategy<Value = String> {
    let segment = prop_oneof![
        Just("..".to_string()),
        Just(".".to_string()),
        Just(String::new()),
        Just("C:".to_string()),
        Just("\\\\srv\\share".to_string()),
        Just("\\\\?\\".to_string()),
        "[A-Za-z0-9 _.-]{1,8}",
    ];
    let separator = prop_oneof![Just("/"), Just("\\"), Just("//")];
    prop::collection::vec((segment, separator), 0..8).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(segment, separator)| format!("{segment}{separator}"))
            .collect::<String>()
    })
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\'])
}

proptest! {
    #[test]
    fn sanitize_is_idempotent(raw in hostile_path()) {
        let once = sanitize(&raw);
        prop_assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn sanitize_never_traverses_upward(raw in hostile_path()) {
        let out = sanitize(&raw);
        prop_assert!(segments(&out).all(|segment| segment != ".."), "{:?} -> {:?}", raw, out);
    }

    #[test]
    fn sanitize_is_always_relative(raw in hostile_path()) {
        let out = sanitize(&raw);
        prop_assert!(!out.is_empty());
        prop_assert!(!out.starts_with('/') && !out.starts_with('\\'));
        prop_assert_eq!(strip_foreign_volume(&out), out.as_str());
        prop_assert!(Path::new(&out).is_relative());
    }

    #[test]
    fn arbitrary_strings_are_handled(raw in any::<String>()) {
        let out = sanitize(&raw);
        prop_assert_eq!(sanitize(&out), out.clone());
        prop_assert!(segments(&out).all(|segment| segment != ".."));
        prop_assert!(!out.starts_with('/') && !out.starts_with('\\'));
    }
}
