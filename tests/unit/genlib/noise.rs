use super::*;

#[test]
fn persistence_halves_amplitude_per_octave() {
    let layers = NoiseLayers::with_persistence(8, 0.5);
    let got: Vec<_> = layers.iter().collect();
    assert_eq!(got, vec![(1, 2047), (2, 4095), (4, 8191), (8, 16383)]);
    assert_eq!(layers.max_wave_length(), 8);
}

#[test]
fn non_power_of_two_maximum_rounds_down() {
    let layers = NoiseLayers::with_persistence(100, 0.5);
    assert_eq!(layers.max_wave_length(), 64);
}

#[test]
fn standard_layers_are_not_empty() {
    let layers = NoiseLayers::standard();
    assert_eq!(layers.max_wave_length(), 256);
    assert!(!layers.is_empty());
}
