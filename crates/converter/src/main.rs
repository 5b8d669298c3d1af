use anyhow::Context;
use converter::cli::Cli;
use converter::runtime::{boot, convert};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(cli) = Cli::parse_or_usage() else {
        return Ok(());
    };

    let config = boot::boot().context("Failed to load configuration")?;

    let report = convert::convert(&cli.log_file, &cli.output_file, &config)
        .await
        .with_context(|| {
            format!(
                "Failed to convert {} into {}",
                cli.log_file.display(),
                cli.output_file.display()
            )
        })?;

    tracing::info!("Wrote {} records", report.rows_written);
    Ok(())
}
