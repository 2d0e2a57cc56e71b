//! Post-hoc audio effects: pitch shift and time stretch.
//!
//! Both effects run a short-time phase vocoder. Pitch shift stretches the
//! signal by the semitone factor and resamples back to the original sample
//! count, so duration is preserved; time stretch changes duration while
//! keeping pitch. [`apply`] runs pitch first, then speed — stretching first
//! would change what the semitone offset sounds like.

use std::f32::consts::PI;

use rustfft::{num_complex::Complex32, FftPlanner};

use crate::Waveform;

/// Analysis/synthesis window size in samples.
const WINDOW: usize = 2048;

/// Synthesis hop: 75% window overlap.
const HOP: usize = WINDOW / 4;

/// Apply pitch shift then time stretch to a waveform.
///
/// `pitch_semitones` of 0 together with a `speed` of 1.0 is an exact
/// identity: the input samples are returned unchanged.
pub fn apply(input: &Waveform, pitch_semitones: i32, speed: f32) -> Waveform {
    let speed_is_identity = (speed - 1.0).abs() < f32::EPSILON;
    if pitch_semitones == 0 && speed_is_identity {
        return input.clone();
    }

    let mut samples = input.samples.clone();
    if pitch_semitones != 0 {
        samples = pitch_shift(&samples, pitch_semitones);
    }
    if !speed_is_identity {
        samples = time_stretch(&samples, speed);
    }

    log::debug!(
        "applied pitch {pitch_semitones:+} st, speed {speed:.2}x: {} -> {} samples",
        input.samples.len(),
        samples.len()
    );

    Waveform {
        samples,
        sample_rate: input.sample_rate,
    }
}

/// Shift pitch by `semitones` while preserving duration.
fn pitch_shift(samples: &[f32], semitones: i32) -> Vec<f32> {
    let factor = 2f32.powf(semitones as f32 / 12.0);
    // Stretch to len * factor at constant pitch, then resample back to the
    // original length; the resample scales every frequency by `factor`.
    let stretched = time_stretch(samples, 1.0 / factor);
    resample_linear(&stretched, samples.len())
}

/// Stretch playback rate by `rate` (>1 shortens, <1 lengthens) while
/// preserving pitch. Output length is `len / rate`, rounded.
fn time_stretch(samples: &[f32], rate: f32) -> Vec<f32> {
    let target_len = (samples.len() as f32 / rate).round() as usize;
    let hop_ana = ((HOP as f32) * rate).round().max(1.0) as usize;

    // Inputs shorter than one analysis frame cannot feed the vocoder;
    // plain resampling is the best available approximation.
    if samples.len() < WINDOW + hop_ana {
        log::warn!(
            "input too short for phase vocoder ({} samples), falling back to resampling",
            samples.len()
        );
        return resample_linear(samples, target_len);
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(WINDOW);
    let ifft = planner.plan_fft_inverse(WINDOW);

    let window: Vec<f32> = (0..WINDOW)
        .map(|n| 0.5 * (1.0 - ((2.0 * PI * n as f32) / (WINDOW - 1) as f32).cos()))
        .collect();

    let frames = (samples.len() - WINDOW) / hop_ana + 1;
    let out_len = (frames - 1) * HOP + WINDOW;
    let mut out = vec![0f32; out_len];
    let mut norm = vec![0f32; out_len];

    // Reused between frames
    let mut buf = vec![Complex32::ZERO; WINDOW];
    let mut prev_phase = vec![0f32; WINDOW];
    let mut acc_phase = vec![0f32; WINDOW];

    for frame in 0..frames {
        let start = frame * hop_ana;
        for (dst, (&x, &w)) in buf
            .iter_mut()
            .zip(samples[start..start + WINDOW].iter().zip(&window))
        {
            *dst = Complex32::new(x * w, 0.0);
        }
        fft.process(&mut buf);

        for (bin, c) in buf.iter_mut().enumerate() {
            let mag = c.norm();
            let phase = c.im.atan2(c.re);
            // Bin center frequency in radians per sample
            let omega = 2.0 * PI * bin as f32 / WINDOW as f32;

            if frame == 0 {
                acc_phase[bin] = phase;
            } else {
                // Deviation from the expected phase advance gives the true
                // bin frequency; re-accumulate it at the synthesis hop.
                let deviation = wrap_phase(phase - prev_phase[bin] - omega * hop_ana as f32);
                let true_freq = omega + deviation / hop_ana as f32;
                acc_phase[bin] = wrap_phase(acc_phase[bin] + true_freq * HOP as f32);
            }
            prev_phase[bin] = phase;
            *c = Complex32::from_polar(mag, acc_phase[bin]);
        }

        ifft.process(&mut buf);

        // Overlap-add; rustfft does not normalize the inverse transform.
        let scale = 1.0 / WINDOW as f32;
        let out_start = frame * HOP;
        for i in 0..WINDOW {
            out[out_start + i] += buf[i].re * scale * window[i];
            norm[out_start + i] += window[i] * window[i];
        }
    }

    for (o, n) in out.iter_mut().zip(&norm) {
        if *n > 1e-6 {
            *o /= *n;
        }
    }

    out.resize(target_len, 0.0);
    out
}

/// Resample to `out_len` samples by linear interpolation over proportional
/// positions. Changes pitch along with duration.
fn resample_linear(samples: &[f32], out_len: usize) -> Vec<f32> {
    if samples.is_empty() || out_len == 0 {
        return vec![0.0; out_len];
    }
    if samples.len() == 1 || out_len == 1 {
        return vec![samples[0]; out_len];
    }

    let step = (samples.len() - 1) as f32 / (out_len - 1) as f32;
    (0..out_len)
        .map(|i| {
            let pos = i as f32 * step;
            let idx = pos as usize;
            let frac = pos - idx as f32;
            if idx + 1 < samples.len() {
                samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
            } else {
                samples[samples.len() - 1]
            }
        })
        .collect()
}

/// Wrap a phase value into `(-PI, PI]`.
fn wrap_phase(x: f32) -> f32 {
    x - 2.0 * PI * (x / (2.0 * PI)).round()
}
