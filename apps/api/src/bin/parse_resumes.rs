//! Batch resume parsing: every `.pdf`/`.txt` in the input directory becomes a
//! `<stem>_parsed.json` file in the output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use job_assistant::resume::extract::{extract_text, DocumentFormat};
use job_assistant::resume::models::ParsedResume;
use job_assistant::resume::parser::parse_resume;

#[derive(Debug, Parser)]
#[command(name = "parse-resumes", about = "Parse a directory of resumes into JSON")]
struct Args {
    /// Directory holding .pdf and .txt resumes
    #[arg(long, env = "RESUME_INPUT_DIR", default_value = "sample_resumes")]
    input_dir: PathBuf,

    /// Directory the parsed JSON files are written to
    #[arg(long, env = "RESUME_OUTPUT_DIR", default_value = "parsed_resumes")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("job_assistant=info,parse_resumes=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    for dir in [&args.input_dir, &args.output_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Could not create directory {}", dir.display()))?;
    }

    let files = resume_files(&args.input_dir).await?;
    if files.is_empty() {
        warn!("No .pdf or .txt files found in {}", args.input_dir.display());
        return Ok(());
    }

    let mut parsed = 0usize;
    let mut failed = 0usize;
    for (path, format) in &files {
        match parse_file(path, *format).await {
            Ok(resume) => match write_output(&args.output_dir, path, &resume).await {
                Ok(out) => {
                    parsed += 1;
                    info!(
                        "Parsed {} -> {} ({} skills, {} experience records)",
                        path.display(),
                        out.display(),
                        resume.skills.len(),
                        resume.experience.len()
                    );
                }
                Err(e) => {
                    failed += 1;
                    error!("Could not write output for {}: {e:#}", path.display());
                }
            },
            Err(e) => {
                failed += 1;
                error!("Could not parse {}: {e:#}", path.display());
            }
        }
    }

    info!("Done: {parsed} parsed, {failed} failed, {} total", files.len());
    Ok(())
}

/// Supported files in `dir`, sorted by path.
async fn resume_files(dir: &Path) -> Result<Vec<(PathBuf, DocumentFormat)>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Could not read directory {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let format = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("pdf") => DocumentFormat::Pdf,
            Some("txt") => DocumentFormat::PlainText,
            _ => continue,
        };
        files.push((path, format));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

async fn parse_file(path: &Path, format: DocumentFormat) -> Result<ParsedResume> {
    let bytes = tokio::fs::read(path).await?;
    let text = extract_text(bytes, format).await?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(parse_resume(&text, &filename)?)
}

async fn write_output(output_dir: &Path, source: &Path, resume: &ParsedResume) -> Result<PathBuf> {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume".to_string());
    let out = output_dir.join(format!("{stem}_parsed.json"));
    let json = serde_json::to_string_pretty(resume)?;
    tokio::fs::write(&out, json).await?;
    Ok(out)
}
