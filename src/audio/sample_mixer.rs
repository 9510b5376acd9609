// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
//! Saturating arithmetic on 16-bit PCM samples.

/// Adds two samples, clamping to the i16 range instead of wrapping.
#[inline]
pub fn mix_samples(a: i16, b: i16) -> i16 {
    let sum = i32::from(a) + i32::from(b);
    sum.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Scales a sample by a linear gain. Float to int casts saturate.
#[inline]
pub fn scale_sample(sample: i16, gain: f32) -> i16 {
    (f32::from(sample) * gain) as i16
}

/// Mixes `source` into `destination` with the given gain applied to each source sample.
pub fn mix_into(destination: &mut [i16], source: &[i16], gain: f32) {
    for (dst, &src) in destination.iter_mut().zip(source) {
        *dst = mix_samples(*dst, scale_sample(src, gain));
    }
}

/// Applies a gain to every sample in place.
pub fn apply_gain(samples: &mut [i16], gain: f32) {
    if gain == 1.0 {
        return;
    }
    for sample in samples.iter_mut() {
        *sample = scale_sample(*sample, gain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_without_overflow_is_addition() {
        assert_eq!(mix_samples(100, 200), 300);
        assert_eq!(mix_samples(-100, 50), -50);
        assert_eq!(mix_samples(0, 0), 0);
        assert_eq!(mix_samples(i16::MAX, 0), i16::MAX);
        assert_eq!(mix_samples(i16::MIN, 0), i16::MIN);
    }

    #[test]
    fn test_mix_saturates() {
        assert_eq!(mix_samples(i16::MAX, 1), i16::MAX);
        assert_eq!(mix_samples(i16::MAX, i16::MAX), i16::MAX);
        assert_eq!(mix_samples(i16::MIN, -1), i16::MIN);
        assert_eq!(mix_samples(i16::MIN, i16::MIN), i16::MIN);
        assert_eq!(mix_samples(30000, 10000), i16::MAX);
        assert_eq!(mix_samples(-30000, -10000), i16::MIN);
    }

    #[test]
    fn test_mix_exhaustive_stride() {
        // Walk a coarse grid across the whole domain.
        let values: Vec<i16> = (i16::MIN..=i16::MAX).step_by(97).collect();
        for &a in &values {
            for &b in &values {
                let expected = (a as i32 + b as i32).clamp(i16::MIN as i32, i16::MAX as i32);
                assert_eq!(mix_samples(a, b) as i32, expected);
            }
        }
    }

    #[test]
    fn test_scale_sample() {
        assert_eq!(scale_sample(1000, 0.5), 500);
        assert_eq!(scale_sample(1000, 0.0), 0);
        assert_eq!(scale_sample(-1000, 1.0), -1000);
        assert_eq!(scale_sample(i16::MAX, 2.0), i16::MAX);
    }

    #[test]
    fn test_mix_into_with_gain() {
        let mut dst = vec![100i16, -100, i16::MAX, 0];
        let src = vec![200i16, 200, 1000, -400];
        mix_into(&mut dst, &src, 0.5);
        assert_eq!(dst, vec![200, 0, i16::MAX, -200]);
    }

    #[test]
    fn test_apply_gain() {
        let mut samples = vec![1000i16, -1000, 0];
        apply_gain(&mut samples, 0.25);
        assert_eq!(samples, vec![250, -250, 0]);
    }
}
