use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use opcode_testgen::{
    generate, Config, HttpRemote, DEFAULT_BASE_URL, DEFAULT_OUTPUT_PATH, DEFAULT_TESTDATA_DIR,
    DEFAULT_TESTDATA_PREFIX,
};

#[derive(Debug, Parser)]
#[command(name = "opcode_testgen", version)]
#[command(about = "Generate Odin opcode tests from the 8088 single-step test corpus")]
struct Cli {
    /// Corpus root URL.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Directory for metadata.json and the downloaded test vectors.
    #[arg(long, default_value = DEFAULT_TESTDATA_DIR)]
    testdata_dir: PathBuf,

    /// Generated Odin test file.
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Path prefix used for test vectors inside the generated file.
    #[arg(long, default_value = DEFAULT_TESTDATA_PREFIX)]
    testdata_prefix: String,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config {
        base_url: cli.base_url,
        testdata_dir: cli.testdata_dir,
        output_path: cli.output,
        testdata_prefix: cli.testdata_prefix,
    };

    let remote = HttpRemote::new(config.base_url.clone());
    generate(&config, remote)
        .with_context(|| format!("generate {}", config.output_path.display()))?;
    Ok(())
}
