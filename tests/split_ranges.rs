use timecourse::error::TimecourseError;
use timecourse::range::{parse_range_spec, split_ranges};

#[test]
fn one_or_two_tokens_form_a_single_range() {
    assert_eq!(split_ranges("3").unwrap(), vec!["3"]);
    assert_eq!(split_ranges("3 5").unwrap(), vec!["3 5"]);
    // surplus whitespace collapses to a single space
    assert_eq!(split_ranges("  3 \t 5 ").unwrap(), vec!["3 5"]);
}

#[test]
fn even_token_counts_are_paired() {
    assert_eq!(split_ranges("3 5 7 9").unwrap(), vec!["3 5", "7 9"]);
    assert_eq!(split_ranges("0 1 2 3 4 5").unwrap(), vec!["0 1", "2 3", "4 5"]);
}

#[test]
fn odd_token_counts_are_rejected() {
    for spec in ["3 5 7", "1 2 3 4 5", ""] {
        let err = split_ranges(spec).unwrap_err();
        assert!(matches!(err, TimecourseError::IllegalArgument(_)), "'{spec}' gave {err}");
    }
}

#[test]
fn range_specs_parse_to_inclusive_bounds() {
    assert_eq!(parse_range_spec("4").unwrap(), (4, 4));
    assert_eq!(parse_range_spec(" 3 5 ").unwrap(), (3, 5));
    assert_eq!(parse_range_spec("-2 6").unwrap(), (-2, 6));
    for bad in ["x", "3 y", "1 2 3", "99999999999"] {
        assert!(matches!(parse_range_spec(bad), Err(TimecourseError::FormatViolation { .. })), "{bad}");
    }
}
