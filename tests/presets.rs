use mixdown_core::{get_mix_preset, list_presets, OutputFormat};

#[test]
fn unknown_preset_equals_default() {
    assert_eq!(
        get_mix_preset("anything-unknown"),
        get_mix_preset("rapper-over-beat")
    );
}

#[test]
fn preset_data_is_not_shared() {
    let a = get_mix_preset("tv-commercial");
    let mut b = get_mix_preset("tv-commercial");
    assert_eq!(a, b);

    b.settings.lufs_target = -8.0;
    b.settings.output_format = OutputFormat::Social;
    assert_eq!(get_mix_preset("tv-commercial"), a);
}

#[test]
fn every_listed_preset_resolves_to_itself() {
    let names = list_presets();
    assert_eq!(names.len(), 5);
    for (name, _) in names {
        assert_eq!(get_mix_preset(&name).name, name);
    }
}

#[test]
fn presets_serialize_flat() {
    let json = serde_json::to_value(get_mix_preset("podcast-intro")).unwrap();
    assert_eq!(json["name"], "podcast-intro");
    assert_eq!(json["outputFormat"], "podcast");
    assert_eq!(json["lufsTarget"], -16.0);
}
