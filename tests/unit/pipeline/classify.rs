use super::*;

#[test]
fn rejects_fewer_than_two_inputs() {
    let none: [&str; 0] = [];
    assert!(matches!(
        classify_inputs(&none).unwrap_err(),
        StackError::InvalidInput(_)
    ));
    assert!(matches!(
        classify_inputs(&["a.png"]).unwrap_err(),
        StackError::InvalidInput(_)
    ));
    assert!(matches!(
        classify_inputs(&["anim.gif"]).unwrap_err(),
        StackError::InvalidInput(_)
    ));
}

#[test]
fn splits_static_and_animated_preserving_order() {
    let plan = classify_inputs(&["c.png", "anim.gif", "a.png", "b.jpg"]).unwrap();
    assert_eq!(
        plan.static_paths,
        vec![
            PathBuf::from("c.png"),
            PathBuf::from("a.png"),
            PathBuf::from("b.jpg")
        ]
    );
    assert_eq!(plan.animated, Some(PathBuf::from("anim.gif")));
    assert!(plan.is_animated());
}

#[test]
fn static_only_inputs_have_no_animated_source() {
    let plan = classify_inputs(&["a.png", "b.png"]).unwrap();
    assert_eq!(plan.static_paths.len(), 2);
    assert_eq!(plan.animated, None);
    assert!(!plan.is_animated());
}

#[test]
fn rejects_second_animated_input() {
    let err = classify_inputs(&["a.gif", "x.png", "b.gif"]).unwrap_err();
    match err {
        StackError::MultipleAnimated { first, second } => {
            assert_eq!(first, PathBuf::from("a.gif"));
            assert_eq!(second, PathBuf::from("b.gif"));
        }
        other => panic!("expected MultipleAnimated, got {other:?}"),
    }
}

#[test]
fn extension_match_is_case_insensitive_and_exact() {
    assert!(is_animated_path(Path::new("dir/ANIM.GIF")));
    assert!(is_animated_path(Path::new("anim.Gif")));
    assert!(!is_animated_path(Path::new("gif")));
    assert!(!is_animated_path(Path::new("anim.gif.png")));
    assert!(!is_animated_path(Path::new("anim.gifv")));
}

#[test]
fn classification_does_not_touch_the_filesystem() {
    let plan = classify_inputs(&[
        "/definitely/missing/base.png",
        "/definitely/missing/anim.gif",
    ])
    .unwrap();
    assert_eq!(plan.static_paths.len(), 1);
}
