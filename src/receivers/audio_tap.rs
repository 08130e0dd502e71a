/*!
The analysis tap on the speech clip that is currently playing.

Playback happens elsewhere. The host publishes the playback position and the
latest window of time-domain samples whenever it has them, and the frame loop
reads whatever was published last.
*/

use log::debug;

use crate::model::EnergyConfig;

/// Clock and samples of the playing clip, read once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipFrame<'a> {
    /// Seconds since the start of the clip.
    pub time: f64,
    pub samples: &'a [f32],
}

#[derive(Debug, Default)]
pub struct AudioTap {
    playing: bool,
    time: f64,
    samples: Vec<f32>,
}

impl AudioTap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the playback position and a window of samples in [-1, 1].
    pub fn publish(&mut self, time: f64, samples: &[f32]) {
        self.playing = true;
        self.time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        self.samples.clear();
        self.samples.extend_from_slice(samples);
    }

    /// Publish an unsigned 8-bit analyser window, where 128 is silence.
    pub fn publish_bytes(&mut self, time: f64, bytes: &[u8]) {
        let samples = bytes
            .iter()
            .map(|v| (f32::from(*v) - 128.0) / 128.0)
            .collect::<Vec<_>>();

        self.publish(time, &samples);
    }

    /// Detach from the clip. Energy reads as 0 until something is published again.
    pub fn stop(&mut self) {
        if self.playing {
            debug!("Audio tap stopped at {:.3}s", self.time);
        }

        self.playing = false;
        self.time = 0.0;
        self.samples.clear();
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn frame(&self) -> Option<ClipFrame<'_>> {
        self.playing.then(|| ClipFrame {
            time: self.time,
            samples: &self.samples,
        })
    }
}

/// Root mean square of a sample window. Non-finite samples count as silence.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum = samples
        .iter()
        .map(|v| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 })
        .map(|v| v * v)
        .sum::<f32>();

    (sum / samples.len() as f32).sqrt()
}

/// Reduce a sample window to a loudness scalar in [0, 1].
pub fn energy(samples: &[f32], config: &EnergyConfig) -> f32 {
    let e = (rms(samples) * config.gain).powf(config.exponent);
    if e.is_finite() {
        e.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Energy of the playing clip, exactly 0 when nothing plays.
pub fn frame_energy(frame: Option<&ClipFrame>, config: &EnergyConfig) -> f32 {
    frame.map_or(0.0, |v| energy(v.samples, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence() {
        let config = EnergyConfig::default();

        assert_eq!(energy(&[0.0; 2048], &config), 0.0);
        assert_eq!(energy(&[], &config), 0.0);
    }

    #[test]
    fn full_scale_clamps_to_one() {
        let config = EnergyConfig::default();
        let square = (0..2048)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect::<Vec<f32>>();

        assert_eq!(rms(&square), 1.0);
        assert_eq!(energy(&square, &config), 1.0);
    }

    #[test]
    fn response_curve() {
        let config = EnergyConfig::default();
        let samples = [0.25, -0.25, 0.25, -0.25];

        let expected = (0.25f32 * 1.8).powf(1.3);
        assert!((energy(&samples, &config) - expected).abs() < 1e-6);
    }

    #[test]
    fn bounded_for_garbage() {
        let config = EnergyConfig::default();
        let windows: [&[f32]; 4] = [
            &[f32::NAN, 0.5],
            &[f32::INFINITY, f32::NEG_INFINITY],
            &[50.0, -50.0, 12.0],
            &[1e-30, -1e-30],
        ];

        for samples in windows {
            let e = energy(samples, &config);
            assert!((0.0..=1.0).contains(&e), "{samples:?} -> {e}");
        }
    }

    #[test]
    fn not_playing_is_zero() {
        let mut tap = AudioTap::new();
        let config = EnergyConfig::default();

        assert_eq!(frame_energy(tap.frame().as_ref(), &config), 0.0);

        tap.publish(0.5, &[1.0, -1.0]);
        assert_eq!(frame_energy(tap.frame().as_ref(), &config), 1.0);

        tap.stop();
        assert!(!tap.is_playing());
        assert_eq!(frame_energy(tap.frame().as_ref(), &config), 0.0);
    }

    #[test]
    fn byte_windows() {
        let mut tap = AudioTap::new();

        tap.publish_bytes(0.1, &[128, 128, 128]);
        assert_eq!(rms(tap.frame().unwrap().samples), 0.0);

        tap.publish_bytes(0.2, &[0, 0]);
        let frame = tap.frame().unwrap();
        assert_eq!(frame.time, 0.2);
        assert_eq!(rms(frame.samples), 1.0);
    }

    #[test]
    fn bad_clock_is_zero() {
        let mut tap = AudioTap::new();

        tap.publish(f64::NAN, &[]);
        assert_eq!(tap.frame().unwrap().time, 0.0);
    }
}
