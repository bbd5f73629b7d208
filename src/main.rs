use anyhow::Result;
use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use media_transcriptor::cli::{Cli, Commands, OutputFormat};
use media_transcriptor::config::Config;
use media_transcriptor::download::ConsoleProgress;
use media_transcriptor::media::{is_valid_url, CONTENT_TYPE_EXTENSIONS, DEFAULT_EXTENSION, SUPPORTED_EXTENSIONS};
use media_transcriptor::output::{self, DEFAULT_TRANSCRIPT_FILE};
use media_transcriptor::transcribe::{TranscriptionPipeline, LANGUAGE_OPTIONS};
use media_transcriptor::utils::format_duration;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "media_transcriptor=debug,transcriptor=debug"
    } else {
        "media_transcriptor=info,transcriptor=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Transcribe {
            url,
            language,
            output: output_path,
            save,
            format,
            api_key,
        } => {
            if !is_valid_url(url.trim()) {
                eprintln!(
                    "{} Please enter a valid HTTP/HTTPS URL to a media file.",
                    style("error:").red().bold()
                );
                return Ok(ExitCode::FAILURE);
            }

            let config = Config::load(cli.config.as_deref())?;
            let format = format
                .or_else(|| OutputFormat::from_config(&config.app.default_output_format))
                .unwrap_or(OutputFormat::Text);

            let pipeline = match TranscriptionPipeline::from_config(&config, api_key) {
                Ok(pipeline) => pipeline,
                Err(err) => {
                    eprintln!("{} {}", style("error:").red().bold(), err);
                    return Ok(ExitCode::FAILURE);
                }
            };

            tracing::info!("Starting transcription for URL: {}", url);

            let result = {
                let mut progress = ConsoleProgress::new(cli.quiet);
                pipeline
                    .transcribe_url(&url, language.as_deref(), &mut progress)
                    .await
            };

            let result = match result {
                Ok(result) => result,
                Err(err) => {
                    eprintln!("{} {}", style("error:").red().bold(), err);
                    return Ok(ExitCode::FAILURE);
                }
            };

            eprintln!(
                "{} Transcription complete ({})",
                style("✔").green(),
                format_duration(result.elapsed_secs)
            );

            let destination = output_path.or_else(|| save.then(|| PathBuf::from(DEFAULT_TRANSCRIPT_FILE)));
            match destination {
                Some(path) => {
                    output::save_to_file(&result, &path, &format)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&result, &format)?;
                }
            }
        }
        Commands::Config { show } => {
            let path = Config::config_path(cli.config.as_deref())?;
            let config = Config::load(Some(path.as_path()))?;
            if show {
                config.display();
            } else {
                println!("Configuration file: {}", path.display());
                println!("Edit it to change the API endpoint, model, timeouts or defaults.");
            }
        }
        Commands::Formats => {
            println!("Supported media extensions:");
            println!("  {}", SUPPORTED_EXTENSIONS.join(" "));
            println!();
            println!("Content types:");
            for (content_type, ext) in CONTENT_TYPE_EXTENSIONS {
                println!("  {:<18} {}", content_type, ext);
            }
            println!();
            println!("Unrecognized media is saved as {}", DEFAULT_EXTENSION);
        }
        Commands::Languages => {
            println!("Transcription languages:");
            for language in LANGUAGE_OPTIONS {
                println!("  • {}", language);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
