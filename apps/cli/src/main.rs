mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use centerprint_printing::{
    spool_job, ImageSize, PdfAdapter, PrintJobController, RasterAdapter,
};
use clap::{Args, Parser, Subcommand};
use image::io::Reader as ImageReader;
use image::DynamicImage;
use log::debug;
use serde_json::json;

use crate::settings::{PageArgs, PageSetup};

#[derive(Parser)]
#[command(
    name = "centerprint-cli",
    about = "Print images one per page, scaled to fit and centred",
    author,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 將圖檔輸出為 PDF 列印作業。 / Spool images to a PDF print job.
    Print(PrintArgs),
    /// 只計算每頁的放置位置並輸出 JSON。 / Show where every page would be drawn, as JSON.
    Layout(PageArgs),
}

#[derive(Args)]
struct PrintArgs {
    #[command(flatten)]
    page: PageArgs,

    /// 輸出的 PDF 檔。 / PDF file receiving the job.
    #[arg(long, value_name = "PDF")]
    output: PathBuf,

    /// 另外輸出每頁 PNG 預覽的資料夾。 / Also write a PNG preview of every page here.
    #[arg(long, value_name = "DIR")]
    preview_dir: Option<PathBuf>,

    /// 預覽解析度（1 至 1200）。 / Preview resolution in dots per inch (1 to 1200).
    #[arg(long, value_name = "DPI")]
    preview_dpi: Option<u32>,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli { command } = Cli::parse();
    match command {
        Commands::Print(args) => execute_print(args),
        Commands::Layout(args) => execute_layout(args),
    }
}

fn execute_print(args: PrintArgs) -> Result<()> {
    let setup = PageSetup::resolve(&args.page)?;
    let preview_dpi = match &args.preview_dir {
        Some(_) => Some(setup.preview_dpi(args.preview_dpi)?),
        None => None,
    };
    let images = load_images(&args.page.images)?;
    let mut controller = PrintJobController::with_policy(&images, setup.scaling);
    if let Some(page) = setup.current_page {
        controller.set_current_page(page)?;
    }

    let summary = spool_job(
        &mut controller,
        setup.range,
        &setup.options,
        &PdfAdapter::new(&args.output),
    )?;
    println!(
        "Printed {} page(s) to {}",
        summary.pages_rendered,
        args.output.display()
    );

    if let (Some(dir), Some(dpi)) = (&args.preview_dir, preview_dpi) {
        let summary = spool_job(
            &mut controller,
            setup.range,
            &setup.options,
            &RasterAdapter::new(dir, dpi),
        )?;
        println!(
            "Wrote {} preview page(s) to {}",
            summary.pages_rendered,
            dir.display()
        );
    }

    Ok(())
}

fn execute_layout(args: PageArgs) -> Result<()> {
    let setup = PageSetup::resolve(&args)?;
    let sizes = args
        .images
        .iter()
        .map(|path| read_dimensions(path))
        .collect::<Result<Vec<_>>>()?;
    let mut controller = PrintJobController::with_policy(&sizes, setup.scaling);
    if let Some(page) = setup.current_page {
        controller.set_current_page(page)?;
    }

    let area = setup.options.printable_area();
    let mut pages = Vec::new();
    for page in controller.pages(setup.range, || area)? {
        let page = page?;
        let index = page.page_number as usize - 1;
        pages.push(json!({
            "page": page.page_number,
            "image": args.images[index].display().to_string(),
            "x": page.rect.x,
            "y": page.rect.y,
            "width": page.rect.width,
            "height": page.rect.height,
            "scale": page.rect.scale,
        }));
    }

    let report = json!({
        "range": setup.range.to_string(),
        "printable_area": { "width": area.width_pt, "height": area.height_pt },
        "pages": pages,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_images(paths: &[PathBuf]) -> Result<Vec<DynamicImage>> {
    paths
        .iter()
        .map(|path| {
            debug!("decoding {}", path.display());
            ImageReader::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?
                .with_guessed_format()
                .with_context(|| format!("failed to read {}", path.display()))?
                .decode()
                .with_context(|| format!("failed to decode {}", path.display()))
        })
        .collect()
}

fn read_dimensions(path: &Path) -> Result<ImageSize> {
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("failed to read dimensions of {}", path.display()))?;
    Ok(ImageSize::new(width as f32, height as f32))
}
