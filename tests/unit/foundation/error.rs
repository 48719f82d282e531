use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        StardreamError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        StardreamError::image_load("x")
            .to_string()
            .contains("image load error:")
    );
    assert!(
        StardreamError::texture_build("x")
            .to_string()
            .contains("texture build error:")
    );
    assert!(
        StardreamError::export("x")
            .to_string()
            .contains("export error:")
    );
    assert!(
        StardreamError::persistence("x")
            .to_string()
            .contains("persistence error:")
    );
    assert!(
        StardreamError::config_integrity("x")
            .to_string()
            .contains("configuration integrity error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StardreamError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn slot_local_errors_are_classified() {
    assert!(StardreamError::image_load("missing").is_slot_local());
    assert!(StardreamError::texture_build("tainted").is_slot_local());
    assert!(!StardreamError::export("no renderer").is_slot_local());
    assert!(!StardreamError::persistence("disk full").is_slot_local());
}
