//! Playable audio clips

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::debug;

use crate::error::{Result, SoundError};
use crate::model::AcousticWaveformSeries;
use crate::widgets::{resolve_window, TimeWindow};

/// A clip ready for playback: interleaved samples normalised to peak 1.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl AudioClip {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Interleaved samples in `[-1, 1]`.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    fn wav_spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    fn write_samples<W: std::io::Write + std::io::Seek>(
        &self,
        mut writer: WavWriter<W>,
    ) -> Result<()> {
        for &sample in &self.samples {
            writer.write_sample((sample * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Encode as a 16-bit PCM WAV file in memory.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_samples(WavWriter::new(&mut cursor, self.wav_spec())?)?;
        Ok(cursor.into_inner())
    }

    /// Write a 16-bit PCM WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let writer = WavWriter::create(path, self.wav_spec())?;
        self.write_samples(writer)?;
        debug!(
            "Wrote {} frames at {} Hz to {}",
            self.num_frames(),
            self.sample_rate,
            path.display()
        );
        Ok(())
    }
}

/// Clip of `series` over `window`, or over the whole series.
///
/// # Errors
/// * `InvalidRate` - If the rate rounds to zero Hz
/// * `TimeWindowOutOfRange` - If the window falls outside the series
/// * `NonFiniteAudio` - If the window holds NaN or infinite samples
pub fn play_sound(series: &AcousticWaveformSeries, window: Option<TimeWindow>) -> Result<AudioClip> {
    let rate = series.rate().round();
    if rate < 1.0 || rate > u32::MAX as f64 {
        return Err(SoundError::InvalidRate {
            rate: series.rate(),
            reason: "playback needs a rate of at least 1 Hz".to_string(),
        });
    }

    let (start, stop, _) = resolve_window(series, window)?;
    let slice = series.data().frames(start, stop)?;
    let values: Vec<f64> = slice
        .values()
        .to_f64_vec()
        .into_iter()
        .map(|v| v * series.conversion() + series.offset())
        .collect();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(SoundError::NonFiniteAudio);
    }

    let peak = values.iter().fold(0.0f64, |peak, v| peak.max(v.abs()));
    let scale = if peak > 0.0 { 1.0 / peak } else { 0.0 };

    Ok(AudioClip {
        sample_rate: rate as u32,
        channels: slice.num_channels() as u16,
        samples: values.iter().map(|v| (v * scale) as f32).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SampleArray;
    use hound::WavReader;

    #[test]
    fn test_normalised_stereo_clip() {
        let frames: Vec<[i16; 2]> = vec![[100, -200], [50, 0], [0, 200]];
        let series = AcousticWaveformSeries::builder(
            "s",
            SampleArray::from_frames(frames).unwrap(),
            44100.4,
            "d",
        )
        .build()
        .unwrap();
        let clip = play_sound(&series, None).unwrap();
        assert_eq!(clip.sample_rate(), 44100);
        assert_eq!(clip.channels(), 2);
        assert_eq!(clip.num_frames(), 3);
        assert_eq!(clip.samples(), &[0.5, -1.0, 0.25, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_wav_header() {
        let series = AcousticWaveformSeries::builder(
            "s",
            SampleArray::from_vec(vec![0.1f32, -0.2, 0.3, 0.0]),
            16000.0,
            "d",
        )
        .build()
        .unwrap();
        let bytes = play_sound(&series, None).unwrap().to_wav_bytes().unwrap();
        let reader = WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 4);
    }

    #[test]
    fn test_silence_stays_silent() {
        let series = AcousticWaveformSeries::builder("s", SampleArray::from_vec(vec![0i16; 10]), 100.0, "d")
            .build()
            .unwrap();
        let clip = play_sound(&series, None).unwrap();
        assert!(clip.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_zero_rate_rejected() {
        let series = AcousticWaveformSeries::builder("s", SampleArray::from_vec(vec![1i16; 10]), 0.0, "d")
            .build()
            .unwrap();
        let err = play_sound(&series, None).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RATE");
    }
}
