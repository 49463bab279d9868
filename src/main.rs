use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::str::FromStr;

use truelayer_gif as lib;
use truelayer_gif::color::metric::MetricKind;
use truelayer_gif::config::Config;
use truelayer_gif::dither::DithererKind;
use truelayer_gif::gif::LoopCount;
use truelayer_gif::pixelbuf::RgbaBuffer;
use truelayer_gif::plan::ColorOrdering;
use truelayer_gif::quantize::QuantizerKind;

/// Convert a truecolor image into a layered animated GIF approximating
/// 24-bit color.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct App {
    /// Image file
    #[clap(name = "FILE")]
    input: PathBuf,

    /// Output GIF path
    #[clap(short = 'o', long = "out", default_value = "out.gif")]
    output: PathBuf,

    /// Quantization algorithm
    #[clap(short = 'q', long = "quantizer", default_value = "median-cut")]
    quantizer: QuantizerKind,

    /// Total colors the source histogram is reduced to before sub-image
    /// planning
    #[clap(short = 'c', long = "total-colors", default_value_t = truelayer_gif::config::DEFAULT_TOTAL_COLORS)]
    total_colors: usize,

    /// Wrap the quantizer with PCA preprocessing
    #[clap(long = "use-pca")]
    use_pca: bool,

    /// Refine the palette with iterative ant-colony-style reassignment
    #[clap(long = "use-ant-refinement")]
    use_ant_refinement: bool,

    /// Iterations for `--use-ant-refinement`
    #[clap(long = "ant-iterations", default_value_t = 25)]
    ant_iterations: usize,

    /// Dithering algorithm
    #[clap(short = 'd', long = "ditherer", default_value = "floyd-steinberg")]
    ditherer: DithererArg,

    /// Overrides `--ditherer` with an ordered Bayer matrix of size
    /// `2^bayer-index`; ignored unless in `1..=8`
    #[clap(long = "bayer-index", default_value_t = 0)]
    bayer_index: u32,

    /// Color-distance metric
    #[clap(short = 'm', long = "metric", default_value = "default")]
    metric: MetricKind,

    /// How distinct colors are ordered across sub-images
    #[clap(long = "color-ordering", default_value = "most-used-first")]
    color_ordering: ColorOrdering,

    /// Disable the full-frame background-initializing first sub-image
    #[clap(long = "no-background-init")]
    no_background_init: bool,

    /// Paint every pixel of non-background sub-images with its nearest
    /// approximation, not just exact-match pixels
    #[clap(long = "use-back-filling")]
    use_back_filling: bool,

    /// Emit uncompressed LZW framing (CLEAR before every symbol)
    #[clap(long = "no-compression")]
    no_compression: bool,

    /// Number of times the animation repeats; 0 means infinite
    #[clap(long = "loop-count", default_value_t = 0)]
    loop_count: u16,

    /// Delay of the final frame, in hundredths of a second
    #[clap(long = "final-delay", default_value_t = truelayer_gif::config::DEFAULT_FINAL_DELAY_HUNDREDTHS)]
    final_delay: u16,

    /// Seed for the `random` color ordering
    #[clap(long = "random-seed", default_value_t = 0)]
    random_seed: u64,

    /// Print progress information to stderr
    #[clap(short = 'v', long = "verbose")]
    verbose: bool,
}

/// Named dithering presets exposed on the command line; library users
/// reaching for a specific kernel, curve, or profile construct
/// [`DithererKind`] directly instead.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum DithererArg {
    None,
    FloydSteinberg,
    Atkinson,
    JarvisJudiceNinke,
    Stucki,
    Burkes,
    Sierra,
    SierraLite,
    Halftone,
    Uniform,
    Riemersma,
    NoiseWhite,
    NoiseBlue,
    NoiseBrown,
    NoisePink,
    Knoll,
    NClosest,
    NConvex,
    AdaptiveQuality,
    AdaptiveBalanced,
    AdaptivePerformance,
    AdaptiveSmart,
}

impl FromStr for DithererArg {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "none" => Ok(DithererArg::None),
            "floyd-steinberg" | "floydsteinberg" => Ok(DithererArg::FloydSteinberg),
            "atkinson" => Ok(DithererArg::Atkinson),
            "jarvis-judice-ninke" | "jjn" => Ok(DithererArg::JarvisJudiceNinke),
            "stucki" => Ok(DithererArg::Stucki),
            "burkes" => Ok(DithererArg::Burkes),
            "sierra" => Ok(DithererArg::Sierra),
            "sierra-lite" => Ok(DithererArg::SierraLite),
            "halftone" => Ok(DithererArg::Halftone),
            "uniform" => Ok(DithererArg::Uniform),
            "riemersma" => Ok(DithererArg::Riemersma),
            "noise-white" => Ok(DithererArg::NoiseWhite),
            "noise-blue" => Ok(DithererArg::NoiseBlue),
            "noise-brown" => Ok(DithererArg::NoiseBrown),
            "noise-pink" => Ok(DithererArg::NoisePink),
            "knoll" => Ok(DithererArg::Knoll),
            "n-closest" => Ok(DithererArg::NClosest),
            "n-convex" => Ok(DithererArg::NConvex),
            "adaptive" | "adaptive-balanced" => Ok(DithererArg::AdaptiveBalanced),
            "adaptive-quality" => Ok(DithererArg::AdaptiveQuality),
            "adaptive-performance" => Ok(DithererArg::AdaptivePerformance),
            "adaptive-smart" => Ok(DithererArg::AdaptiveSmart),
            _ => Err("no such ditherer"),
        }
    }
}

impl DithererArg {
    fn into_kind(self) -> DithererKind {
        use truelayer_gif::dither::{adaptive, error_diffusion, n_closest, n_convex, noise, riemersma};
        match self {
            DithererArg::None => DithererKind::None,
            DithererArg::FloydSteinberg => DithererKind::ErrorDiffusion {
                kernel: error_diffusion::KernelKind::FloydSteinberg,
                serpentine: true,
            },
            DithererArg::Atkinson => DithererKind::ErrorDiffusion {
                kernel: error_diffusion::KernelKind::Atkinson,
                serpentine: true,
            },
            DithererArg::JarvisJudiceNinke => DithererKind::ErrorDiffusion {
                kernel: error_diffusion::KernelKind::JarvisJudiceNinke,
                serpentine: true,
            },
            DithererArg::Stucki => DithererKind::ErrorDiffusion {
                kernel: error_diffusion::KernelKind::Stucki,
                serpentine: true,
            },
            DithererArg::Burkes => DithererKind::ErrorDiffusion {
                kernel: error_diffusion::KernelKind::Burkes,
                serpentine: true,
            },
            DithererArg::Sierra => DithererKind::ErrorDiffusion {
                kernel: error_diffusion::KernelKind::Sierra,
                serpentine: true,
            },
            DithererArg::SierraLite => DithererKind::ErrorDiffusion {
                kernel: error_diffusion::KernelKind::SierraLite,
                serpentine: true,
            },
            DithererArg::Halftone => DithererKind::Halftone,
            DithererArg::Uniform => DithererKind::Uniform,
            DithererArg::Riemersma => DithererKind::Riemersma {
                curve: riemersma::Curve::Hilbert,
                history: 16,
            },
            DithererArg::NoiseWhite => DithererKind::Noise {
                spectrum: noise::Spectrum::White,
                intensity: 0.3,
            },
            DithererArg::NoiseBlue => DithererKind::Noise {
                spectrum: noise::Spectrum::Blue,
                intensity: 0.3,
            },
            DithererArg::NoiseBrown => DithererKind::Noise {
                spectrum: noise::Spectrum::Brown,
                intensity: 0.3,
            },
            DithererArg::NoisePink => DithererKind::Noise {
                spectrum: noise::Spectrum::Pink,
                intensity: 0.3,
            },
            DithererArg::Knoll => DithererKind::Knoll {
                matrix_size: 4,
                k: 4,
                error_multiplier: 1.0,
            },
            DithererArg::NClosest => DithererKind::NClosest {
                n: 4,
                rule: n_closest::Rule::Nearest,
            },
            DithererArg::NConvex => DithererKind::NConvex {
                n: 4,
                strategy: n_convex::Strategy::Nearest,
            },
            DithererArg::AdaptiveQuality => DithererKind::Adaptive {
                profile: adaptive::Profile::QualityOptimized,
            },
            DithererArg::AdaptiveBalanced => DithererKind::Adaptive {
                profile: adaptive::Profile::Balanced,
            },
            DithererArg::AdaptivePerformance => DithererKind::Adaptive {
                profile: adaptive::Profile::PerformanceOptimized,
            },
            DithererArg::AdaptiveSmart => DithererKind::Adaptive {
                profile: adaptive::Profile::Smart,
            },
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let App {
        input,
        output,
        quantizer,
        total_colors,
        use_pca,
        use_ant_refinement,
        ant_iterations,
        ditherer,
        bayer_index,
        metric,
        color_ordering,
        no_background_init,
        use_back_filling,
        no_compression,
        loop_count,
        final_delay,
        random_seed,
        verbose,
    } = App::parse();

    let img = image::open(&input)?.to_rgb8();
    let (width, height) = img.dimensions();
    if verbose {
        eprintln!("loaded {:?}: {}x{}", input, width, height);
    }

    let buf = RgbaBuffer::from_rgb8(width, height, img.as_raw());

    let config = Config {
        quantizer,
        use_pca,
        use_ant_refinement,
        ant_iterations,
        total_colors,
        ditherer: ditherer.into_kind(),
        bayer_index,
        metric,
        color_ordering,
        first_sub_image_inits_background: !no_background_init,
        use_back_filling,
        no_compression,
        loop_count: if loop_count == 0 { LoopCount::Infinite } else { LoopCount::Finite(loop_count) },
        final_delay_hundredths: final_delay,
        random_seed,
    };

    let mut writer = BufWriter::new(File::create(&output)?);
    lib::convert(&buf, &config, &mut writer)?;

    if verbose {
        eprintln!("wrote {:?}", output);
    }

    Ok(())
}
