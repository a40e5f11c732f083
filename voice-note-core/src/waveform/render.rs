use crate::models::config::WaveformStyle;
use crate::waveform::reducer;

/// Axis-aligned rectangle in view coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarFill {
    Played,
    Unplayed,
}

/// One positioned waveform bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarShape {
    pub rect: Rect,
    pub corner_radius: f32,
    pub fill: BarFill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformPalette {
    pub played: Rgba,
    pub unplayed: Rgba,
}

impl WaveformPalette {
    pub fn color(&self, fill: BarFill) -> Rgba {
        match fill {
            BarFill::Played => self.played,
            BarFill::Unplayed => self.unplayed,
        }
    }
}

impl Default for WaveformPalette {
    fn default() -> Self {
        Self {
            played: Rgba::new(255, 255, 255, 255),
            unplayed: Rgba::new(255, 255, 255, 102),
        }
    }
}

/// Drawing surface the waveform paints onto.
pub trait Canvas {
    fn set_antialias(&mut self, enabled: bool);

    fn fill_rounded_rect(&mut self, rect: Rect, corner_radius: f32, color: Rgba);
}

/// Whether bar `index` of `bars` lies at or before the playhead.
///
/// Any progress that is not a positive normal number (including the `-1`
/// "nothing played" sentinel) marks every bar unplayed.
pub fn is_played(index: usize, bars: usize, progress: f64) -> bool {
    if !(progress.is_normal() && progress > 0.0) {
        return false;
    }
    let playhead = (bars as f64 * progress.clamp(0.0, 1.0)).floor() as usize;
    index <= playhead
}

/// Stateless renderer from a level trace to colored bars.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaveformView {
    pub style: WaveformStyle,
    pub palette: WaveformPalette,
}

impl WaveformView {
    pub fn new(style: WaveformStyle, palette: WaveformPalette) -> Self {
        Self { style, palette }
    }

    /// Position one bar per bucket across a `width` x `height` view.
    ///
    /// Bars are vertically centered and snapped to whole pixels.
    pub fn layout(&self, samples: &[f32], width: f32, height: f32, progress: f64) -> Vec<BarShape> {
        let bars = reducer::bar_count(width, &self.style);
        let heights = reducer::reduce(samples, bars, height, &self.style);
        let pitch = self.style.bar_width + self.style.bar_spacing;
        let count = heights.len();

        heights
            .into_iter()
            .enumerate()
            .map(|(k, bar_height)| {
                let bar_height = bar_height.round();
                BarShape {
                    rect: Rect {
                        x: (k as f32 * pitch).round(),
                        y: ((height - bar_height) / 2.0).round(),
                        width: self.style.bar_width,
                        height: bar_height,
                    },
                    corner_radius: self.style.bar_width / 2.0,
                    fill: if is_played(k, count, progress) {
                        BarFill::Played
                    } else {
                        BarFill::Unplayed
                    },
                }
            })
            .collect()
    }

    /// Paint the waveform. Draws nothing for an empty trace.
    pub fn paint<C: Canvas + ?Sized>(&self, canvas: &mut C, samples: &[f32], width: f32, height: f32, progress: f64) {
        if samples.is_empty() {
            return;
        }
        canvas.set_antialias(false);
        for bar in self.layout(samples, width, height, progress) {
            canvas.fill_rounded_rect(bar.rect, bar.corner_radius, self.palette.color(bar.fill));
        }
    }
}
