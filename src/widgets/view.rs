//! Combined waveform, spectrogram and playback view

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::error::{Result, SoundError};
use crate::model::AcousticWaveformSeries;
use crate::widgets::playback::{play_sound, AudioClip};
use crate::widgets::spectrogram::{plot_spectrogram, Spectrogram, SpectrogramOptions};
use crate::widgets::waveform::{plot_waveform, WaveformTrace};
use crate::widgets::{TimeWindow, DEFAULT_WINDOW_SECS};

/// Waveform above, spectrogram below, sharing one time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundFigure {
    pub waveform: WaveformTrace,
    pub spectrogram: Spectrogram,
}

pub fn plot_sound(
    series: &AcousticWaveformSeries,
    window: Option<TimeWindow>,
    options: &SpectrogramOptions,
) -> Result<SoundFigure> {
    Ok(SoundFigure {
        waveform: plot_waveform(series, window)?,
        spectrogram: plot_spectrogram(series, window, options)?,
    })
}

/// Start and duration of the visible window, bounded to a time range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartAndDurationController {
    start: f64,
    duration: f64,
    min: f64,
    max: f64,
}

/// A controller several views follow. Each view picks up moves made through
/// the handle on its next [`AcousticWaveformView::sync`].
pub type SharedController = Rc<RefCell<StartAndDurationController>>;

impl StartAndDurationController {
    /// Controller over `[min, max]`, opening at `min` with up to
    /// [`DEFAULT_WINDOW_SECS`] visible.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        let duration = (max - min).min(DEFAULT_WINDOW_SECS);
        let mut controller = Self {
            start: min,
            duration,
            min,
            max,
        };
        controller.set(min, duration)?;
        Ok(controller)
    }

    /// Controller spanning the whole series.
    pub fn for_series(series: &AcousticWaveformSeries) -> Result<Self> {
        Self::new(series.starting_time(), series.end_time())
    }

    /// Wrap this controller so several views can follow it.
    pub fn shared(self) -> SharedController {
        Rc::new(RefCell::new(self))
    }

    /// # Errors
    /// * `TimeWindowOutOfRange` - If the window leaves `[min, max]`
    /// * `InvalidData` - If the duration is not positive
    pub fn set(&mut self, start: f64, duration: f64) -> Result<()> {
        let window = TimeWindow::from_start_duration(start, duration)?;
        for time in [window.start(), window.stop()] {
            if time < self.min || time > self.max + 1e-9 {
                return Err(SoundError::TimeWindowOutOfRange {
                    time,
                    min: self.min,
                    max: self.max,
                });
            }
        }
        self.start = start;
        self.duration = duration;
        Ok(())
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            stop: self.start + self.duration,
        }
    }
}

/// Interactive view of one series. A window change replaces the figure and
/// clip with a fresh render; a failed render keeps the last good one.
#[derive(Debug)]
pub struct AcousticWaveformView<'a> {
    series: &'a AcousticWaveformSeries,
    controller: SharedController,
    options: SpectrogramOptions,
    /// Window of the current figure and clip.
    rendered: Option<TimeWindow>,
    figure: Option<SoundFigure>,
    clip: Option<AudioClip>,
    renders: usize,
}

impl<'a> AcousticWaveformView<'a> {
    /// Build the view and render the initial window. With a foreign
    /// controller the view follows that controller's window.
    pub fn new(
        series: &'a AcousticWaveformSeries,
        foreign_controller: Option<SharedController>,
    ) -> Result<Self> {
        let controller = match foreign_controller {
            Some(controller) => controller,
            None => StartAndDurationController::for_series(series)?.shared(),
        };
        let mut view = Self {
            series,
            controller,
            options: SpectrogramOptions::default(),
            rendered: None,
            figure: None,
            clip: None,
            renders: 0,
        };
        view.render()?;
        Ok(view)
    }

    pub fn with_spectrogram_options(mut self, options: SpectrogramOptions) -> Result<Self> {
        self.options = options;
        self.render()?;
        Ok(self)
    }

    /// Move the window and re-render in place. On error the controller and
    /// the current render are left as they were.
    pub fn set_time_window(&mut self, start: f64, duration: f64) -> Result<()> {
        let previous = self.controller();
        self.controller.borrow_mut().set(start, duration)?;
        if let Err(e) = self.render() {
            *self.controller.borrow_mut() = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Re-render if the controller moved since the last render.
    /// Returns whether a render happened.
    pub fn sync(&mut self) -> Result<bool> {
        if self.rendered == Some(self.controller().window()) {
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    fn render(&mut self) -> Result<()> {
        let window = self.controller().window();
        debug!(
            "Rendering {} over [{}, {})",
            self.series.name(),
            window.start(),
            window.stop()
        );
        let figure = plot_sound(self.series, Some(window), &self.options)?;
        let clip = play_sound(self.series, Some(window))?;

        self.figure = Some(figure);
        self.clip = Some(clip);
        self.rendered = Some(window);
        self.renders += 1;
        Ok(())
    }

    pub fn series(&self) -> &AcousticWaveformSeries {
        self.series
    }

    /// Current controller state.
    pub fn controller(&self) -> StartAndDurationController {
        *self.controller.borrow()
    }

    /// Handle for linking another view to this one.
    pub fn shared_controller(&self) -> SharedController {
        Rc::clone(&self.controller)
    }

    /// Window the current figure and clip show.
    pub fn rendered_window(&self) -> Option<TimeWindow> {
        self.rendered
    }

    pub fn figure(&self) -> Option<&SoundFigure> {
        self.figure.as_ref()
    }

    pub fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    /// Number of completed renders.
    pub fn render_count(&self) -> usize {
        self.renders
    }
}
