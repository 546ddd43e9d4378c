use super::*;

#[test]
fn bounds_clamp_negative_sizes() {
    let b = Bounds::new(1.0, 2.0, -5.0, 3.0);
    assert_eq!(b.width, 0.0);
    assert!(b.is_empty());
}

#[test]
fn inset_shrinks_each_side() {
    let b = Bounds::new(0.0, 0.0, 100.0, 50.0).inset(Insets {
        top: 5.0,
        right: 10.0,
        bottom: 5.0,
        left: 20.0,
    });
    assert_eq!(b, Bounds::new(20.0, 5.0, 70.0, 40.0));
    assert_eq!(b.right(), 90.0);
    assert_eq!(b.bottom(), 45.0);
}

#[test]
fn rect_conversion_round_trips() {
    let b = Bounds::new(3.0, 4.0, 10.0, 20.0);
    assert_eq!(Bounds::from(b.to_rect()), b);
    assert_eq!(b.center(), Point::new(8.0, 14.0));
}
