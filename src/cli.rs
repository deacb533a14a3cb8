//! `galleria` command line: lay out a directory of images at a given width.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::GalleryConfig;
use crate::layout::{
    ColumnBreakpoints, ColumnCount, LayoutConfig, LayoutMode, LayoutResult, DEFAULT_TARGET_HEIGHT,
};
use crate::runtime::{Gallery, GalleryOutput};
use crate::scanner::{discover_images, load_dimensions, LoadSummary, ScanConfig};
use crate::scheduler::LayoutPass;

const DEFAULT_WIDTH_PX: f32 = 1200.0;
const DEFAULT_WORKERS: usize = 4;

pub const USAGE: &str = "\
Usage: galleria [OPTIONS] <DIRECTORY>

Options:
  --width <PX>         Container width (default 1200)
  --mode <MODE>        justified | masonry
  --row-height <PX>    Target row height for justified mode
  --columns <N>        Fixed column count for masonry mode
  --gap <PX>           Gap between items
  --recursive          Descend into subdirectories
  --workers <N>        Concurrent dimension reads (default 4)
  -h, --help           Print this help";

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub path: PathBuf,
    pub width: f32,
    pub mode: Option<String>,
    pub row_height: Option<f32>,
    pub columns: Option<u32>,
    pub gap: Option<f32>,
    pub recursive: bool,
    pub workers: usize,
}

/// Parsed command line, or a request for help.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(CliArgs),
    Help,
}

fn next_value<T>(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = args
        .next()
        .with_context(|| format!("Missing value for {}", flag))?;
    value
        .parse::<T>()
        .with_context(|| format!("Failed to parse {} value {:?}", flag, value))
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command> {
    let mut args = args.into_iter();
    let mut path = None;
    let mut width = DEFAULT_WIDTH_PX;
    let mut mode = None;
    let mut row_height = None;
    let mut columns = None;
    let mut gap = None;
    let mut recursive = false;
    let mut workers = DEFAULT_WORKERS;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--width" => width = next_value(&mut args, "--width")?,
            "--mode" => mode = Some(next_value::<String>(&mut args, "--mode")?.to_ascii_lowercase()),
            "--row-height" => row_height = Some(next_value(&mut args, "--row-height")?),
            "--columns" => columns = Some(next_value(&mut args, "--columns")?),
            "--gap" => gap = Some(next_value(&mut args, "--gap")?),
            "--recursive" => recursive = true,
            "--workers" => workers = next_value(&mut args, "--workers")?,
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => {
                if path.is_some() {
                    bail!("Unexpected extra argument: {}", other);
                }
                path = Some(PathBuf::from(other));
            }
        }
    }

    if !width.is_finite() || width <= 0.0 {
        bail!("--width must be greater than 0");
    }
    if workers == 0 {
        bail!("--workers must be greater than 0");
    }
    if let Some(mode) = mode.as_deref() {
        if mode != "justified" && mode != "masonry" {
            bail!("--mode must be 'justified' or 'masonry', got {:?}", mode);
        }
    }

    let path = path.context("Missing <DIRECTORY> argument")?;
    Ok(Command::Run(CliArgs {
        path,
        width,
        mode,
        row_height,
        columns,
        gap,
        recursive,
        workers,
    }))
}

/// Apply command line overrides on top of the environment configuration.
pub fn resolve_config(args: &CliArgs, mut config: GalleryConfig) -> Result<GalleryConfig> {
    if let Some(gap) = args.gap {
        config.layout.gap_px = gap;
    }

    let current_row_height = match config.layout.mode {
        LayoutMode::Justified { target_row_height } => target_row_height,
        LayoutMode::Masonry { .. } => DEFAULT_TARGET_HEIGHT,
    };
    config.layout.mode = match (args.mode.as_deref(), args.columns, args.row_height) {
        (Some("masonry"), columns, _) => LayoutMode::Masonry {
            columns: columns
                .map(ColumnCount::Fixed)
                .unwrap_or(ColumnCount::Responsive(ColumnBreakpoints::default())),
        },
        (Some(_), _, row_height) => LayoutMode::Justified {
            target_row_height: row_height.unwrap_or(current_row_height),
        },
        (None, Some(_), Some(_)) => {
            bail!("--columns and --row-height select different modes; pass --mode to choose")
        }
        (None, Some(count), None) => LayoutMode::Masonry {
            columns: ColumnCount::Fixed(count),
        },
        (None, None, Some(row_height)) => LayoutMode::Justified {
            target_row_height: row_height,
        },
        (None, None, None) => config.layout.mode,
    };

    LayoutConfig {
        container_width: args.width,
        gap_px: config.layout.gap_px,
        mode: config.layout.mode,
    }
    .validate()
    .context("Invalid layout settings")?;

    Ok(config)
}

/// Scan, load dimensions, lay out, print.
pub async fn run(args: CliArgs, config: GalleryConfig) -> Result<()> {
    let scan = ScanConfig {
        recursive: args.recursive,
        ..Default::default()
    };
    let entries = discover_images(&args.path, &scan)
        .with_context(|| format!("Failed to scan {}", args.path.display()))?;

    // Quiet period after the last output before the layout counts as settled.
    let settle = config.scheduler.debounce * 4 + Duration::from_millis(100);

    let (gallery, handle, outputs) = Gallery::new(&config);
    let driver = async {
        handle.replace_items(entries.iter().map(|e| e.pending_item()).collect());
        handle.resize(args.width);
        let summary = load_dimensions(entries.clone(), handle.clone(), args.workers).await;

        let mut last_pass = None;
        loop {
            match tokio::time::timeout(settle, outputs.recv_async()).await {
                Ok(Ok(GalleryOutput::Layout(pass))) => last_pass = Some(pass),
                Ok(Ok(_)) => {}
                Ok(Err(_)) | Err(_) => break,
            }
        }
        handle.shutdown();
        (summary, last_pass)
    };

    let ((), (summary, last_pass)) = tokio::join!(gallery.run(), driver);

    info!(
        images = entries.len(),
        resolved = summary.resolved,
        failed = summary.failed,
        "Dimension loading finished"
    );
    let pass = last_pass.context("Gallery produced no layout")?;
    print!("{}", render_pass(&pass, &summary));
    Ok(())
}

/// Plain-text report of one layout pass.
pub fn render_pass(pass: &LayoutPass, summary: &LoadSummary) -> String {
    let mut out = format!(
        "width {} | {} items ({} failed) | height {:.0}\n",
        pass.container_width,
        pass.layout.item_count(),
        summary.failed,
        pass.layout.total_height()
    );
    match &pass.layout {
        LayoutResult::Justified(result) => {
            for row in &result.rows {
                out.push_str(&format!(
                    "row {:>3} y={:<7.0} h={:<5.0}{}",
                    row.row_index,
                    row.y,
                    row.height_px,
                    if row.is_final_row { " (final)" } else { "" }
                ));
                for item in &row.items {
                    out.push_str(&format!(" {}@{:.0}:{:.0}", item.id, item.x, item.width_px));
                }
                out.push('\n');
            }
        }
        LayoutResult::Masonry(result) => {
            out.push_str(&format!(
                "{} columns of {:.1}px\n",
                result.column_count, result.column_width
            ));
            for p in &result.placements {
                out.push_str(&format!(
                    "{} col {} at ({:.0}, {:.0}) {:.0}x{:.0}\n",
                    p.id, p.column, p.x, p.y, p.width_px, p.height_px
                ));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run_args(list: &[&str]) -> CliArgs {
        match parse_args(args(list)).unwrap() {
            Command::Run(args) => args,
            Command::Help => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_defaults() {
        let parsed = run_args(&["photos"]);
        assert_eq!(parsed.path, PathBuf::from("photos"));
        assert_eq!(parsed.width, DEFAULT_WIDTH_PX);
        assert_eq!(parsed.workers, DEFAULT_WORKERS);
        assert!(!parsed.recursive);
        assert!(parsed.mode.is_none());
    }

    #[test]
    fn test_parse_options() {
        let parsed = run_args(&[
            "--width", "900", "--mode", "Masonry", "--columns", "3", "--gap", "10", "--recursive",
            "dir",
        ]);
        assert_eq!(parsed.width, 900.0);
        assert_eq!(parsed.mode.as_deref(), Some("masonry"));
        assert_eq!(parsed.columns, Some(3));
        assert_eq!(parsed.gap, Some(10.0));
        assert!(parsed.recursive);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["--width"])).is_err());
        assert!(parse_args(args(&["--width", "wide", "dir"])).is_err());
        assert!(parse_args(args(&["--width", "0", "dir"])).is_err());
        assert!(parse_args(args(&["--mode", "grid", "dir"])).is_err());
        assert!(parse_args(args(&["--bogus", "dir"])).is_err());
        assert!(parse_args(args(&["a", "b"])).is_err());
        assert_eq!(parse_args(args(&["--help"])).unwrap(), Command::Help);
    }

    #[test]
    fn test_resolve_config_modes() {
        let base = GalleryConfig::default();

        let masonry = resolve_config(&run_args(&["--columns", "2", "d"]), base).unwrap();
        assert_eq!(
            masonry.layout.mode,
            LayoutMode::Masonry {
                columns: ColumnCount::Fixed(2)
            }
        );

        let justified = resolve_config(&run_args(&["--row-height", "150", "d"]), base).unwrap();
        assert_eq!(
            justified.layout.mode,
            LayoutMode::Justified {
                target_row_height: 150.0
            }
        );

        let untouched = resolve_config(&run_args(&["d"]), base).unwrap();
        assert_eq!(untouched, base);

        assert!(resolve_config(&run_args(&["--columns", "3", "--row-height", "150", "d"]), base).is_err());
        let chosen = resolve_config(
            &run_args(&["--mode", "masonry", "--columns", "3", "--row-height", "150", "d"]),
            base,
        )
        .unwrap();
        assert_eq!(
            chosen.layout.mode,
            LayoutMode::Masonry {
                columns: ColumnCount::Fixed(3)
            }
        );

        assert!(resolve_config(&run_args(&["--columns", "0", "d"]), base).is_err());
        assert!(resolve_config(&run_args(&["--gap", "-1", "d"]), base).is_err());
    }

    #[tokio::test]
    async fn test_run_lays_out_directory() {
        let dir = tempdir().unwrap();
        RgbImage::new(160, 90).save(dir.path().join("a.png")).unwrap();
        RgbImage::new(90, 160).save(dir.path().join("b.png")).unwrap();

        let parsed = run_args(&["--width", "500", dir.path().to_str().unwrap()]);
        let config = resolve_config(&parsed, GalleryConfig::default()).unwrap();
        run(parsed, config).await.unwrap();
    }

    #[test]
    fn test_render_justified_report() {
        use crate::models::{GalleryItem, ItemId};
        use crate::layout::compute_layout;

        let items: Vec<_> = (0..3)
            .map(|i| GalleryItem::new(ItemId(i), 400.0, 300.0))
            .collect();
        let config = LayoutConfig::justified(600.0, 200.0, 0.0);
        let pass = LayoutPass {
            generation: 1,
            container_width: 600.0,
            pending_items: 0,
            coalesced_triggers: 1,
            columns_changed: false,
            layout: compute_layout(&items, &config),
        };
        let report = render_pass(&pass, &LoadSummary::default());
        assert!(report.starts_with("width 600 | 3 items"));
        assert!(report.contains("row   0"));
        assert!(report.contains("(final)"));
    }
}
