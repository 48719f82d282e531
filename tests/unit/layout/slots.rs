use super::*;
use crate::layout::presets::{PRESET_COUNT, PRESET_POSITIONS};

#[test]
fn dream_base_is_bit_identical_across_calls() {
    let poster = PosterSpec::default();
    for i in 0..PRESET_COUNT as i32 {
        let a = dream_base_placement(i, poster).unwrap();
        let b = dream_base_placement(i, poster).unwrap();
        assert_eq!(a.base.x.to_bits(), b.base.x.to_bits());
        assert_eq!(a.base.y.to_bits(), b.base.y.to_bits());
        assert_eq!(a.pos_multiplier.to_bits(), b.pos_multiplier.to_bits());
        assert_eq!(a.base_rotation.to_bits(), b.base_rotation.to_bits());
    }
}

#[test]
fn dream_base_stays_within_jitter_bounds() {
    let poster = PosterSpec::default();
    let (w, h) = (poster.width_f64(), poster.height_f64());
    for (i, pre) in PRESET_POSITIONS.iter().enumerate() {
        let b = dream_base_placement(i as i32, poster).unwrap();
        assert!((b.base.x - pre.x * w).abs() <= 0.02 * w);
        assert!((b.base.y - pre.y * h).abs() <= 0.02 * h);
        assert!(b.pos_multiplier >= pre.size * 0.8 && b.pos_multiplier < pre.size * 1.2);
        assert!(b.base_rotation.abs() <= 0.45);
        assert_eq!(
            b.base_size,
            DREAM_BASE_FRACTION * poster.min_dim() * b.pos_multiplier
        );
    }
}

#[test]
fn out_of_range_positions_are_not_placed() {
    let poster = PosterSpec::default();
    assert!(dream_base_placement(14, poster).is_none());
    assert!(dream_base_placement(-1, poster).is_none());
    let cfg = SlotEffectConfig::dream(20);
    assert!(slot_placement(SlotId::Dream(0), &cfg, poster, false).is_none());
}

#[test]
fn core_sits_at_center_with_user_offset() {
    let poster = PosterSpec::default();
    let mut cfg = SlotEffectConfig::default();
    let p = slot_placement(SlotId::Core, &cfg, poster, false).unwrap();
    assert_eq!(p.position, Vec2::ZERO);
    assert_eq!(p.base_size, 0.48 * 1800.0);
    assert_eq!(p.z, Z_CORE);
    assert_eq!(p.rotation, 0.0);

    cfg.offset_x = 30.0;
    cfg.offset_y = -10.0;
    cfg.rotation = 90.0;
    cfg.size = 1.5;
    let p = slot_placement(SlotId::Core, &cfg, poster, true).unwrap();
    assert_eq!(p.position, Vec2::new(30.0, -10.0));
    assert!((p.rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    assert_eq!(p.visual_radius(), 0.24 * 1800.0 * 1.5);
    assert_eq!(p.z, Z_CORE);
}

#[test]
fn dream_z_order_depends_on_selection() {
    let poster = PosterSpec::default();
    let mut cfg = SlotEffectConfig::dream(5);
    cfg.offset_x = 12.0;
    cfg.rotation = -45.0;
    let base = dream_base_placement(5, poster).unwrap();

    let p = slot_placement(SlotId::Dream(2), &cfg, poster, false).unwrap();
    assert_eq!(p.z, 55);
    assert_eq!(p.position, base.base + Vec2::new(12.0, 0.0));
    assert!((p.rotation - (base.base_rotation - std::f64::consts::FRAC_PI_4)).abs() < 1e-12);

    let p = slot_placement(SlotId::Dream(2), &cfg, poster, true).unwrap();
    assert_eq!(p.z, 205);
    assert!(p.z < Z_CORE);
}
