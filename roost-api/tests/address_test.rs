use roost_api::address::{ActorId, ActorPath, PATH_SCHEME, USER_GUARDIAN};
use std::collections::HashSet;

#[test]
fn test_top_level_path() {
    let path = ActorPath::top_level("bookings", "supervisor");

    assert_eq!(path.as_str(), "roost://bookings/user/supervisor");
    assert_eq!(path.to_string(), path.as_str());
    assert!(path.as_str().starts_with(&format!("{PATH_SCHEME}://")));
    assert!(path.as_str().contains(&format!("/{USER_GUARDIAN}/")));
    assert_eq!(path.name(), "supervisor");
    assert_eq!(path.depth(), 1);
    assert!(path.is_top_level());
    assert!(path.parent().is_none());
}

#[test]
fn test_child_paths() {
    let supervisor = ActorPath::top_level("bookings", "supervisor");
    let first = supervisor.child("first");
    let nested = first.child("$0");

    assert_eq!(first.as_str(), "roost://bookings/user/supervisor/first");
    assert_eq!(first.name(), "first");
    assert_eq!(first.depth(), 2);
    assert!(!first.is_top_level());
    assert_eq!(nested.name(), "$0");
    assert_eq!(nested.depth(), 3);

    // Walking up gives back the exact ancestors
    assert_eq!(nested.parent(), Some(first.clone()));
    assert_eq!(first.parent(), Some(supervisor.clone()));
    assert_eq!(supervisor.parent(), None);
}

#[test]
fn test_name_validation() {
    for name in ["worker", "First-Child", "seat_42", "a.b"] {
        assert!(ActorPath::validate_name(name).is_ok(), "{name} rejected");
    }
    for name in ["", "$generated", "a/b", "two words", "tab\there"] {
        assert!(ActorPath::validate_name(name).is_err(), "{name:?} accepted");
    }
}

#[test]
fn test_actor_ids_are_unique() {
    let ids: HashSet<ActorId> = (0..1000).map(|_| ActorId::new()).collect();
    assert_eq!(ids.len(), 1000);

    let id = ActorId::default();
    assert_eq!(id, id);
    // Display uses the simple (hyphenless) form
    assert_eq!(id.to_string(), id.as_uuid().simple().to_string());
    assert_eq!(id.to_string().len(), 32);
}
