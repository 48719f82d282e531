use super::*;

#[test]
fn poster_default_is_print_layout() {
    let p = PosterSpec::default();
    assert_eq!((p.width, p.height), (1800, 2400));
    assert_eq!(p.min_dim(), 1800.0);
    assert_eq!(p.center(), Point::new(900.0, 1200.0));
}

#[test]
fn poster_rejects_zero_dimensions() {
    assert!(PosterSpec::new(0, 10).is_err());
    assert!(PosterSpec::new(10, 0).is_err());
    assert!(PosterSpec::new(1, 1).is_ok());
}

#[test]
fn premul_rounds_half_up() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.to_array(), [128, 64, 0, 128]);
}

#[test]
fn shape_color_unpacks_hex_and_clamps_alpha() {
    let c = ShapeColor::new(0x3a7bd5, 0.4);
    assert_eq!(c.rgb, [0x3a, 0x7b, 0xd5]);
    assert_eq!(c.alpha_u8(), 102);
    assert_eq!(ShapeColor::new(0xffffff, 3.0).alpha_u8(), 255);
    assert_eq!(ShapeColor::new(0xffffff, -1.0).alpha_u8(), 0);
}
