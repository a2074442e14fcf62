use crate::ErrorLocation;

/// **VALUE**: Verifies that `ErrorLocation::caller()` reports the line that called it.
///
/// **BUG THIS CATCHES**: Would catch if `#[track_caller]` is dropped from `caller()`,
/// which would make every error in the workspace point at `error_location.rs`.
#[test]
fn given_caller_when_location_captured_then_points_at_call_site() {
    // GIVEN/WHEN: Capturing the location on a known line
    let expected_line = line!() + 1;
    let location = ErrorLocation::caller();

    // THEN: File and line are the test's own
    assert!(
        location.file.ends_with("tests/error_location.rs"),
        "Should capture the test file, got {}",
        location.file
    );
    assert_eq!(location.line, expected_line);
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies the `[file:line:column]` rendering used in every error message.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: A fixed location
    let location = ErrorLocation {
        file: "src/host/mod.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting as string
    let formatted = location.to_string();

    // THEN: Exact bracketed shape
    assert_eq!(formatted, "[src/host/mod.rs:42:7]");
}

/// **VALUE**: Verifies that `#[track_caller]` propagates through helper functions.
///
/// **BUG THIS CATCHES**: Error constructors in host-core are `#[track_caller]` helpers.
/// If propagation breaks, all of them collapse onto one line.
#[test]
fn given_track_caller_helper_when_called_twice_then_lines_differ() {
    #[track_caller]
    fn capture() -> ErrorLocation {
        ErrorLocation::caller()
    }

    let first = capture();
    let second = capture();

    assert_eq!(first.file, second.file);
    assert_eq!(first.line + 1, second.line, "Lines should be sequential");
}
