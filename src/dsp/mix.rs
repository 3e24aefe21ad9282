//! Signal mixing and wet/dry blending primitives.

/*
Wet/Dry Blending
================

  dry   the original signal
  wet   the processed (e.g. filtered) signal

    output = wet × mix + dry × (1 − mix)

mix = 1.0 is fully wet, mix = 0.0 fully dry. The weights always sum to 1.0 so
blending never boosts the level.


Averaging instead of Summing
----------------------------

Voices are combined by their arithmetic mean, not their sum. Two full-scale
sources summed reach 2.0 and clip; their mean stays within [-1.0, 1.0] and
the output level does not jump when a source is added or removed.
*/

/// Blend dry and wet samples (single sample version).
#[inline]
pub fn blend_dry_wet(dry: f32, wet: f32, mix: f32) -> f32 {
    dry * (1.0 - mix) + wet * mix
}

/// Blend a processed buffer with its unprocessed original, in place.
///
/// `wet[i] = wet[i] × mix + dry[i] × (1 − mix)`
#[inline]
pub fn apply_dry_wet(dry: &[f32], wet: &mut [f32], mix: f32) {
    debug_assert_eq!(dry.len(), wet.len());

    if mix >= 1.0 {
        return; // 100% wet, nothing to do
    }

    for (wet_sample, &dry_sample) in wet.iter_mut().zip(dry.iter()) {
        *wet_sample = blend_dry_wet(dry_sample, *wet_sample, mix);
    }
}

/// Fold a stereo pair to mono by averaging.
#[inline]
pub fn fold_to_mono(left: f32, right: f32) -> f32 {
    (left + right) / 2.0
}

/// Arithmetic mean of a set of samples; silence when empty.
#[inline]
pub fn mean(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32
}
