//! Property-based tests for signature derivation and header parsing.

use proptest::prelude::*;
use wsbridge::ResponseHeaders;
use wsbridge::marshal::{Arg, ReturnKind, method_signature, parameter_signature};

/// One argument, described by its expected type code.
#[derive(Debug, Clone)]
enum Case {
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Text(String),
    Strings(Vec<String>),
    Bytes(Vec<u8>),
    Ints(Vec<i32>),
}

impl Case {
    fn code(&self) -> &'static str {
        match self {
            Case::Bool(_) => "Z",
            Case::Int(_) => "I",
            Case::Long(_) => "J",
            Case::Double(_) => "D",
            Case::Text(_) => "Ljava/lang/String;",
            Case::Strings(_) => "[Ljava/lang/String;",
            Case::Bytes(_) => "[B",
            Case::Ints(_) => "[I",
        }
    }

    fn arg(&self) -> Arg<'_> {
        match self {
            Case::Bool(v) => Arg::from(*v),
            Case::Int(v) => Arg::from(*v),
            Case::Long(v) => Arg::from(*v),
            Case::Double(v) => Arg::from(*v),
            Case::Text(s) => Arg::from(s.as_str()),
            Case::Strings(v) => Arg::from(v),
            Case::Bytes(v) => Arg::from(v),
            Case::Ints(v) => Arg::from(v),
        }
    }
}

fn case_strategy() -> impl Strategy<Value = Case> {
    prop_oneof![
        any::<bool>().prop_map(Case::Bool),
        any::<i32>().prop_map(Case::Int),
        any::<i64>().prop_map(Case::Long),
        any::<f64>().prop_map(Case::Double),
        ".{0,8}".prop_map(Case::Text),
        prop::collection::vec(".{0,4}", 0..4).prop_map(Case::Strings),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Case::Bytes),
        prop::collection::vec(any::<i32>(), 0..16).prop_map(Case::Ints),
    ]
}

fn header_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9-]{0,15}"
}

fn header_value() -> impl Strategy<Value = String> {
    "[ -~]{0,24}".prop_map(|v| v.trim_end().to_string())
}

proptest! {
    #[test]
    fn test_signature_is_concatenation_of_codes(
        cases in prop::collection::vec(case_strategy(), 0..8),
    ) {
        let args: Vec<Arg<'_>> = cases.iter().map(Case::arg).collect();
        let expected: String = cases.iter().map(Case::code).collect();
        prop_assert_eq!(parameter_signature(&args), expected.clone());
        prop_assert_eq!(method_signature(&args, ReturnKind::Long), format!("({expected})J"));
    }

    #[test]
    fn test_signature_depends_only_on_types(a in case_strategy(), b in case_strategy()) {
        let same_kind = a.code() == b.code();
        let sig_a = parameter_signature(&[a.arg()]);
        let sig_b = parameter_signature(&[b.arg()]);
        prop_assert_eq!(sig_a == sig_b, same_kind);
    }

    #[test]
    fn test_well_formed_headers_roundtrip(
        pairs in prop::collection::vec((header_name(), header_value()), 0..8)
    ) {
        let blob = pairs
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n");
        let headers = ResponseHeaders::parse(&blob);
        let parsed: Vec<(String, String)> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        prop_assert_eq!(parsed, pairs);
    }

    #[test]
    fn test_header_parsing_never_panics(blob in "\\PC{0,200}") {
        let headers = ResponseHeaders::parse(&blob);
        for (name, _) in headers.iter() {
            prop_assert!(!name.is_empty());
        }
    }

    #[test]
    fn test_records_without_separator_are_dropped(noise in "[A-Za-z0-9]{1,20}") {
        let blob = format!("{noise}\nKeep: me");
        let headers = ResponseHeaders::parse(&blob);
        prop_assert_eq!(headers.len(), 1);
        prop_assert_eq!(headers.get("keep"), Some("me"));
    }
}
