//! Top-level orchestration: histogram -> quantize
//! -> plan -> dither each sub-image -> compose frames -> write GIF89a.

use crate::color::lookup::PaletteLookup;
use crate::color::Color;
use crate::config::Config;
use crate::error::Result;
use crate::frame;
use crate::gif;
use crate::histogram;
use crate::pixelbuf::{IndexBuffer, PixelBuffer, RgbaBuffer};
use crate::plan::{self, PlanOptions};
use crate::quantize::{self, QuantizeOptions};
use log::debug;
use std::io::Write;

/// Converts `source` into a complete GIF89a byte stream written to `sink`,
/// per `config`.
pub fn convert<W: Write>(source: &dyn PixelBuffer, config: &Config, sink: &mut W) -> Result<()> {
    let width = source.width();
    let height = source.height();

    let histogram = histogram::build(source, true);
    debug!("histogram built: {} distinct colors", histogram.len());

    let quantize_options = QuantizeOptions {
        kind: config.quantizer,
        use_pca: config.use_pca,
        use_ant_refinement: config.use_ant_refinement,
        ant_iterations: config.ant_iterations,
        metric: config.metric,
    };
    let total_colors = config.total_colors.min(histogram.len().max(1)).max(1);
    let full_palette = quantize::reduce(&quantize_options, &histogram, total_colors);
    debug!("quantized to {} representative colors", full_palette.len());

    let full_lookup = PaletteLookup::new(full_palette.clone(), config.metric);

    // Every source pixel is mapped once to its nearest representative from
    // the quantized palette; the planner partitions *that* buffer, so
    // "exact match" membership tests land on representative colors instead
    // of the original 16.7M-color space.
    let mut quantized_pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let idx = full_lookup.find_closest(source.get(x, y));
            quantized_pixels.push(full_palette.get(idx).unwrap_or(Color::default()));
        }
    }
    let quantized_buffer = RgbaBuffer::new(width, height, quantized_pixels);
    let quantized_histogram = histogram::build(&quantized_buffer, true);

    let plan_options = PlanOptions {
        color_ordering: config.color_ordering,
        first_sub_image_inits_background: config.first_sub_image_inits_background,
        use_back_filling: config.use_back_filling,
        metric: config.metric,
        random_seed: config.random_seed,
    };
    let plans = plan::plan(&quantized_buffer, &quantized_histogram, &plan_options);
    debug!("planned {} sub-images", plans.len());

    let ditherer = config.effective_ditherer();
    let dithered: Vec<IndexBuffer> = plans
        .iter()
        .map(|p| {
            let lookup = PaletteLookup::new(p.palette.clone(), config.metric);
            let mut buf = IndexBuffer::new(width, height, 0);
            crate::dither::dither(ditherer, source, &mut buf, &lookup);
            buf
        })
        .collect();

    let frames = frame::compose_all(
        &plans,
        &dithered,
        config.first_sub_image_inits_background,
        config.final_delay_hundredths,
    );
    debug!("composed {} frames", frames.len());

    gif::write_gif(
        sink,
        width as u16,
        height as u16,
        None,
        config.loop_count,
        &frames,
        config.no_compression,
    )
}
