use crate::InstanceId;

/// **VALUE**: Verifies that zero and negative ids cannot be constructed.
#[test]
fn given_non_positive_value_when_creating_id_then_returns_none() {
    assert!(InstanceId::new(0).is_none());
    assert!(InstanceId::new(-3).is_none());
    assert_eq!(InstanceId::new(7).map(InstanceId::get), Some(7));
}

/// **VALUE**: Verifies that ids advance by one and render as bare integers.
///
/// **BUG THIS CATCHES**: Directory names under `servers/` are the rendered id,
/// so a Display change would silently move every instance area.
#[test]
fn given_first_id_when_advanced_then_counts_up_and_displays_as_integer() {
    let first = InstanceId::FIRST;
    let second = first.next();

    assert_eq!(first.get(), 1);
    assert_eq!(second.get(), 2);
    assert_eq!(second.to_string(), "2");
    assert!(first < second);
}
