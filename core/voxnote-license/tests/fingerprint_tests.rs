use voxnote_license::generate_machine_id;

#[test]
fn fingerprint_is_64_uppercase_hex_chars() {
    let id = generate_machine_id();
    assert_eq!(id.len(), 64);
    assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn fingerprint_is_stable_within_a_session() {
    let first = generate_machine_id();
    let second = generate_machine_id();
    assert_eq!(first, second);
}

#[test]
fn fingerprint_never_exposes_raw_signals() {
    // A hex digest can't contain separators or probe text.
    let id = generate_machine_id();
    assert!(!id.contains('|'));
    assert!(!id.to_lowercase().contains("unknown"));
}
