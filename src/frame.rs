//! Frame compositor: turns a planned sub-image plus its
//! dithered indexed buffer into the minimal cropped payload the GIF writer
//! emits, picking disposal method and delay along the way.

use crate::palette::Palette;
use crate::pixelbuf::IndexBuffer;
use crate::plan::{PixelMask, SubImagePlan};

/// GIF disposal method for the graphic control extension.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Disposal {
    Unspecified,
    DoNotDispose,
    RestoreBackground,
    RestorePrevious,
}

impl Disposal {
    /// The 3-bit disposal method value packed into the GCE's packed byte.
    pub fn code(self) -> u8 {
        match self {
            Disposal::Unspecified => 0,
            Disposal::DoNotDispose => 1,
            Disposal::RestoreBackground => 2,
            Disposal::RestorePrevious => 3,
        }
    }
}

/// The default GIF delay unit: 1/100s, the smallest representable step.
pub const MIN_DELAY_HUNDREDTHS: u16 = 1;

/// A composited frame ready for LZW encoding and GIF emission.
#[derive(Debug, Clone)]
pub struct Frame {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Row-major, `width * height` palette indices.
    pub indices: Vec<u8>,
    pub transparent_index: Option<u8>,
    pub disposal: Disposal,
    pub delay_hundredths: u16,
    /// The palette this frame's indices were dithered against; becomes its
    /// GIF local color table.
    pub local_palette: Palette,
}

/// Bounding box of every active pixel in `mask`, or `None` if the mask has
/// no active pixels at all.
fn bounding_rect(mask: &PixelMask) -> Option<(u32, u32, u32, u32)> {
    let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
    let (mut max_x, mut max_y) = (0u32, 0u32);
    let mut any = false;

    for y in 0..mask.height() {
        for x in 0..mask.width() {
            if mask.get(x, y) {
                any = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }

    if !any {
        return None;
    }
    Some((min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Composes one sub-image plan plus its full-frame dithered buffer into a
/// cropped [`Frame`]. Returns `None` when the plan's mask has no active
/// pixels.
///
/// `is_first` selects the disposal rule (restore-background only for the
/// first sub-image when it initializes the background); every other
/// sub-image — including a non-background-initializing first one — uses
/// do-not-dispose, so already-painted pixels stay visible underneath.
pub fn compose(plan: &SubImagePlan, dithered: &IndexBuffer, is_first: bool, initializes_background: bool) -> Option<Frame> {
    let (left, top, width, height) = bounding_rect(&plan.mask)?;
    let mut indices = Vec::with_capacity((width * height) as usize);
    let fallback = plan.transparent_index.unwrap_or(0);

    for y in top..top + height {
        for x in left..left + width {
            if plan.mask.get(x, y) {
                indices.push(dithered.get(x, y));
            } else {
                indices.push(fallback);
            }
        }
    }

    let disposal = if is_first && initializes_background {
        Disposal::RestoreBackground
    } else {
        Disposal::DoNotDispose
    };

    Some(Frame {
        left,
        top,
        width,
        height,
        indices,
        transparent_index: plan.transparent_index,
        disposal,
        delay_hundredths: MIN_DELAY_HUNDREDTHS,
        local_palette: plan.palette.clone(),
    })
}

/// Composes every plan in `plans` against its matching dithered buffer,
/// dropping empty ones, and sets the last surviving frame's delay to
/// `final_delay_hundredths`.
pub fn compose_all(
    plans: &[SubImagePlan],
    dithered: &[IndexBuffer],
    initializes_background: bool,
    final_delay_hundredths: u16,
) -> Vec<Frame> {
    let mut frames: Vec<Frame> = plans
        .iter()
        .zip(dithered.iter())
        .enumerate()
        .filter_map(|(i, (plan, buf))| compose(plan, buf, i == 0, initializes_background))
        .collect();

    if let Some(last) = frames.last_mut() {
        last.delay_hundredths = final_delay_hundredths.max(MIN_DELAY_HUNDREDTHS);
    }
    frames
}
