use std::path::Path;

use super::*;
use crate::backend::mock::MockBackend;

fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

#[test]
fn single_image_is_returned_as_is() {
    let backend = MockBackend::new().with_still("a.png", 4, 4);
    let base = composite_static(&backend, &paths(&["a.png"])).unwrap();

    assert_eq!(base.label, "a.png");
    assert!(base.layers.is_empty());
    assert_eq!(backend.ops(), vec!["open:a.png"]);
}

#[test]
fn later_images_are_painted_over_in_input_order() {
    let backend = MockBackend::new()
        .with_still("a.png", 4, 4)
        .with_still("b.png", 4, 4)
        .with_still("c.png", 2, 2);

    let base = composite_static(&backend, &paths(&["a.png", "b.png", "c.png"])).unwrap();

    assert_eq!(base.label, "a.png");
    assert_eq!(base.layers, vec!["Over:b.png", "Over:c.png"]);
    assert_eq!(
        backend.ops(),
        vec!["open:a.png", "open:b.png", "open:c.png", "layer_many:a.png:2"]
    );
}

#[test]
fn failing_first_load_is_fatal() {
    let backend = MockBackend::new().with_still("b.png", 4, 4);
    let err = composite_static(&backend, &paths(&["a.png", "b.png"])).unwrap_err();

    assert!(matches!(err, StackError::Load { ref path, .. } if path == Path::new("a.png")));
    assert_eq!(backend.ops(), vec!["open:a.png"]);
}

#[test]
fn failing_later_load_names_the_path_and_layers_nothing() {
    let backend = MockBackend::new()
        .with_still("a.png", 4, 4)
        .with_still("c.png", 4, 4);

    let err = composite_static(&backend, &paths(&["a.png", "b.png", "c.png"])).unwrap_err();

    assert!(matches!(err, StackError::Load { ref path, .. } if path == Path::new("b.png")));
    assert!(!backend.ops().iter().any(|op| op.starts_with("layer_many")));
    assert_eq!(backend.live_handles(), 0);
}

#[test]
fn empty_list_is_invalid() {
    let backend = MockBackend::new();
    assert!(matches!(
        composite_static(&backend, &[]).unwrap_err(),
        StackError::InvalidInput(_)
    ));
}
