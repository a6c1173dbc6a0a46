/// Unit tests for core pvreplace models
/// Tests policy parsing, display, and site helpers
use pvreplace::models::{CombineMode, MutationPolicy, OccurrenceMode, PartKind, PartSelector, Site};
use pvreplace::Error;

#[test]
fn test_part_kind_display_round_trips() {
    for part in PartKind::ALL {
        let parsed: PartKind = part.to_string().parse().unwrap();
        assert_eq!(parsed, part);
    }
}

#[test]
fn test_part_kind_legacy_name() {
    // path-ext is the historical spelling of ext-filename
    assert_eq!("path-ext".parse::<PartKind>().unwrap(), PartKind::ExtFilename);
}

#[test]
fn test_part_kind_case_and_whitespace() {
    assert_eq!(" Param-Value ".parse::<PartKind>().unwrap(), PartKind::ParamValue);
}

#[test]
fn test_invalid_part_is_config_error() {
    let err = "cookies".parse::<PartKind>().unwrap_err();
    assert!(err.is_config());
    assert!(!err.is_input());
    assert!(matches!(err, Error::InvalidPolicy { axis: "part", .. }));
}

#[test]
fn test_part_selector_all() {
    assert_eq!("all".parse::<PartSelector>().unwrap(), PartSelector::All);
    assert_eq!(PartSelector::All.parts().len(), PartKind::ALL.len());
    assert_eq!(
        "param-name".parse::<PartSelector>().unwrap().parts(),
        vec![PartKind::ParamName]
    );
}

#[test]
fn test_headers_selector_has_no_url_parts() {
    // headers is only meaningful in raw mode; for URLs it selects nothing
    let selector = " Headers ".parse::<PartSelector>().unwrap();
    assert_eq!(selector, PartSelector::Headers);
    assert!(selector.parts().is_empty());
    assert!("headers".parse::<PartKind>().is_err());
}

#[test]
fn test_combine_and_occurrence_parsing() {
    assert_eq!("prefix".parse::<CombineMode>().unwrap(), CombineMode::Prefix);
    assert_eq!("POSTFIX".parse::<CombineMode>().unwrap(), CombineMode::Postfix);
    assert_eq!("single".parse::<OccurrenceMode>().unwrap(), OccurrenceMode::Single);
    assert!("both".parse::<OccurrenceMode>().is_err());
    assert!("append".parse::<CombineMode>().is_err());
}

#[test]
fn test_default_policy() {
    let policy = MutationPolicy::default();
    assert_eq!(policy.part, PartKind::ParamValue);
    assert_eq!(policy.combine, CombineMode::Replace);
    assert_eq!(policy.occurrence, OccurrenceMode::Multiple);
    assert_eq!(policy.to_string(), "param-value/replace/multiple");
}

#[test]
fn test_passthrough_parts() {
    assert!(PartKind::ParamValue.passes_through_unmatched());
    assert!(PartKind::ParamName.passes_through_unmatched());
    assert!(PartKind::ExtFilename.passes_through_unmatched());
    assert!(!PartKind::PathSuffix.passes_through_unmatched());
    assert!(!PartKind::PathSuffixSlash.passes_through_unmatched());
    assert!(!PartKind::PathSegment.passes_through_unmatched());
}

#[test]
fn test_site_content() {
    let url = "http://x.com/?a=1";
    assert_eq!(Site::new(14, 17).content(url), "a=1");
    assert_eq!(Site::at(3).content(url), "");
}
