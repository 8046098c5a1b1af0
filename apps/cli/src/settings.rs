//! Print settings: what a print dialog would collect, read from flags and an optional
//! JSON file. 列印設定：命令列參數優先，其次為設定檔。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use centerprint_printing::{
    Margin, Orientation, PageRange, PaperSize, PrintJobOptions, ScalingPolicy,
};
use clap::{Args, ValueEnum};
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaperChoice {
    A4,
    A3,
    Letter,
    Legal,
}

impl From<PaperChoice> for PaperSize {
    fn from(choice: PaperChoice) -> Self {
        match choice {
            PaperChoice::A4 => PaperSize::a4(),
            PaperChoice::A3 => PaperSize::a3(),
            PaperChoice::Letter => PaperSize::letter(),
            PaperChoice::Legal => PaperSize::legal(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrientationChoice {
    Landscape,
    Portrait,
}

impl From<OrientationChoice> for Orientation {
    fn from(choice: OrientationChoice) -> Self {
        match choice {
            OrientationChoice::Landscape => Orientation::Landscape,
            OrientationChoice::Portrait => Orientation::Portrait,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalingChoice {
    /// Shrink images that do not fit the printable area.
    AutoFit,
    /// Print at native size, clipping what does not fit.
    NoScale,
}

impl From<ScalingChoice> for ScalingPolicy {
    fn from(choice: ScalingChoice) -> Self {
        match choice {
            ScalingChoice::AutoFit => ScalingPolicy::AutoFit,
            ScalingChoice::NoScale => ScalingPolicy::NoScale,
        }
    }
}

/// Page options shared by `print` and `layout`.
#[derive(Args, Debug)]
pub struct PageArgs {
    /// 要列印的圖檔，一張一頁。 / Images to print, one per page.
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// 列印範圍：all、current、N 或 N-M。 / Pages to print: all, current, N or N-M.
    #[arg(long, value_name = "RANGE")]
    pub range: Option<String>,

    /// 目前頁碼，供 `--range current` 使用。 / Page treated as current for `--range current`.
    #[arg(long, value_name = "PAGE")]
    pub current_page: Option<u32>,

    /// 縮放方式。 / Scaling policy.
    #[arg(long)]
    pub scaling: Option<ScalingChoice>,

    /// 紙張大小。 / Paper size.
    #[arg(long)]
    pub paper: Option<PaperChoice>,

    /// 紙張方向；預設為橫式。 / Page orientation (landscape by default).
    #[arg(long)]
    pub orientation: Option<OrientationChoice>,

    /// 四邊邊界（點）。 / Margin on every side, in points.
    #[arg(long, value_name = "POINTS")]
    pub margin: Option<f32>,

    /// JSON 設定檔；命令列參數優先。 / JSON settings file; flags take precedence.
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,
}

/// Contents of a `--settings` file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrintSettings {
    pub paper: Option<PaperChoice>,
    pub orientation: Option<OrientationChoice>,
    pub margin: Option<f32>,
    pub scaling: Option<ScalingChoice>,
    pub range: Option<String>,
    pub preview_dpi: Option<u32>,
}

impl PrintSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse settings {}", path.display()))
    }
}

const DEFAULT_PREVIEW_DPI: u32 = 96;
pub const MAX_PREVIEW_DPI: u32 = 1200;

/// Fully resolved configuration for one job.
#[derive(Debug, Clone)]
pub struct PageSetup {
    pub options: PrintJobOptions,
    pub scaling: ScalingPolicy,
    pub range: PageRange,
    pub current_page: Option<u32>,
    pub preview_dpi: Option<u32>,
}

impl PageSetup {
    pub fn resolve(args: &PageArgs) -> Result<Self> {
        let settings = match &args.settings {
            Some(path) => PrintSettings::load(path)?,
            None => PrintSettings::default(),
        };
        Self::merge(args, settings)
    }

    /// Preview resolution: the flag, then the settings file, then 96 dpi.
    pub fn preview_dpi(&self, flag: Option<u32>) -> Result<u32> {
        let dpi = flag.or(self.preview_dpi).unwrap_or(DEFAULT_PREVIEW_DPI);
        if !(1..=MAX_PREVIEW_DPI).contains(&dpi) {
            anyhow::bail!("preview dpi must be between 1 and {MAX_PREVIEW_DPI}, got {dpi}");
        }
        Ok(dpi)
    }

    fn merge(args: &PageArgs, settings: PrintSettings) -> Result<Self> {
        let paper = args
            .paper
            .or(settings.paper)
            .map(PaperSize::from)
            .unwrap_or_default();
        let orientation = args
            .orientation
            .or(settings.orientation)
            .map(Orientation::from)
            .unwrap_or_default();
        let margin = args.margin.or(settings.margin).unwrap_or(0.0);
        if !margin.is_finite() || margin < 0.0 {
            anyhow::bail!("margin must be a non-negative number of points, got {margin}");
        }
        let scaling = args
            .scaling
            .or(settings.scaling)
            .map(ScalingPolicy::from)
            .unwrap_or_default();
        let range = match args.range.as_deref().or(settings.range.as_deref()) {
            Some(text) => text.parse::<PageRange>()?,
            None => PageRange::All,
        };

        Ok(Self {
            options: PrintJobOptions::new(paper, orientation, Margin::uniform(margin)),
            scaling,
            range,
            current_page: args.current_page,
            preview_dpi: settings.preview_dpi,
        })
    }
}
