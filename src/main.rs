//! rasterblock - Inspect and convert raw raster files.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rasterblock::{
    config::{CacheConfig, Cli, Command, ConvertConfig, InfoConfig},
    format::CreateOptions,
    io::{BlockCache, LocalFile},
    Dataset, DatasetError, DatasetInfo,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = cli.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    match cli.command {
        Command::Info(config) => run_info(&cli.cache, config).await,
        Command::Convert(config) => run_convert(&cli.cache, config).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "rasterblock=debug"
    } else {
        "rasterblock=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn open_source(
    cache: &CacheConfig,
    path: &std::path::Path,
) -> Result<Dataset<BlockCache<LocalFile>>, DatasetError> {
    let file = LocalFile::open(path).await?;
    let reader = BlockCache::with_capacity(file, cache.block_size, cache.cache_blocks);
    Dataset::open(reader).await
}

// =============================================================================
// Info Command
// =============================================================================

async fn run_info(cache: &CacheConfig, config: InfoConfig) -> ExitCode {
    let dataset = match open_source(cache, &config.path).await {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("Failed to open {}: {}", config.path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let info = dataset.info();

    if config.json {
        match serde_json::to_string_pretty(&info) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to encode description: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_info(&info);
    }

    ExitCode::SUCCESS
}

fn print_info(info: &DatasetInfo) {
    println!("{}", info.identifier);
    println!("═════════════════════════════════");
    println!("Format:      {}", info.format);
    println!("Size:        {} x {}, {} band(s)", info.width, info.height, info.band_count);
    println!("Pixel type:  {} ({:?})", info.pixel_type, info.byte_order);
    println!("Blocks:      {} x {}", info.block_width, info.block_height);
    println!(
        "Interleave:  {:?}, rows {:?}",
        info.layout.interleave, info.layout.row_order
    );
    println!(
        "Offsets:     image {}, pixel {}, line {}, band {}",
        info.layout.image_offset,
        info.layout.pixel_offset,
        info.layout.line_offset,
        info.layout.band_offset
    );
    match info.nodata {
        Some(nodata) => println!("Nodata:      {}", nodata),
        None => println!("Nodata:      (none)"),
    }
    println!("File size:   {} bytes", info.file_size);

    if !info.metadata.is_empty() {
        println!();
        println!("Metadata:");
        println!("─────────────────");
        for (key, value) in &info.metadata {
            println!("  {} = {}", key, value);
        }
    }
}

// =============================================================================
// Convert Command
// =============================================================================

async fn run_convert(cache: &CacheConfig, config: ConvertConfig) -> ExitCode {
    match convert(cache, &config).await {
        Ok(info) => {
            println!(
                "✓ Wrote {} ({} x {}, {} band(s) of {})",
                info.identifier, info.width, info.height, info.band_count, info.pixel_type
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("✗ Conversion failed");
            error!(
                "Failed to convert {} to {}: {}",
                config.src.display(),
                config.dst.display(),
                e
            );
            ExitCode::FAILURE
        }
    }
}

async fn convert(cache: &CacheConfig, config: &ConvertConfig) -> Result<DatasetInfo, DatasetError> {
    let src = open_source(cache, &config.src).await?;
    let layout = src.layout().clone();
    let pixel_type = config.pixel_type.unwrap_or(layout.pixel_type);

    let mut options = CreateOptions::new(layout.width, layout.height, layout.band_count, pixel_type);
    options.nodata = config.nodata.or(src.nodata());

    info!(
        "Converting {} ({} {}) to {} {}",
        src.identifier(),
        src.format(),
        layout.pixel_type,
        config.format,
        pixel_type
    );

    let file = LocalFile::create(&config.dst).await?;
    let mut dst = Dataset::create(file, config.format, &options).await?;

    // Bands are read in their own type so the conversion to the output
    // type happens on write.
    for band in 0..layout.band_count {
        let data = src.read_band(band, layout.pixel_type).await?;
        dst.write_band(band, layout.pixel_type, &data).await?;
    }

    let info = dst.info();
    dst.close().await?;
    Ok(info)
}
