//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::ingest::{batch_paths, Ingestor};
use crate::maintenance::{deduplicate_file, normalize_page_filenames, split_file};
use crate::partition::{BatchTransform, PartitionStore, TemporalPartitioner};
use crate::run_log::RunLog;
use crate::schema::CanonicalSchema;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    config: PipelineConfig,
}

impl Runner {
    /// Create a runner, loading the configuration file if one was given
    pub fn new(cli: Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        Ok(Self { cli, config })
    }

    /// Log level for the subscriber: `--verbose` wins over the config file
    pub fn log_level(&self) -> tracing::Level {
        if self.cli.verbose {
            tracing::Level::DEBUG
        } else {
            self.config.log_level.into()
        }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch {
                start_page,
                total_pages,
                max_retries,
                output_dir,
            } => {
                self.fetch(*start_page, *total_pages, *max_retries, output_dir.as_deref())
                    .await
            }
            Commands::Ingest {
                files,
                input_dir,
                first_page,
                last_page,
                partition_dir,
                raw,
            } => {
                let paths = resolve_batches(files, input_dir.as_deref(), *first_page, *last_page)?;
                self.ingest(&paths, partition_dir.as_deref(), *raw)
            }
            Commands::Dedup { file, key } => self.dedup(file, key),
            Commands::Split {
                file,
                parts,
                remove_source,
            } => self.split(file, *parts, *remove_source),
            Commands::PadNames {
                dir,
                start,
                end,
                width,
            } => self.pad_names(dir, *start, *end, *width),
        }
    }

    async fn fetch(
        &self,
        start_page: Option<u64>,
        total_pages: Option<u64>,
        max_retries: Option<u32>,
        output_dir: Option<&Path>,
    ) -> Result<()> {
        let mut config = self.config.clone();
        if let Some(start) = start_page {
            config.fetch.start_page = start;
        }
        if let Some(total) = total_pages {
            config.fetch.total_pages = total;
        }
        if let Some(retries) = max_retries {
            config.fetch.max_retries = retries;
        }
        if let Some(dir) = output_dir {
            config.fetch.output_dir = dir.to_path_buf();
        }
        config.validate()?;

        if config.fetch.start_page == config.fetch.total_pages {
            warn!("Nothing to download: start page equals total pages");
        }

        let fetcher = Fetcher::new(config.fetch_config())?;
        let report = fetcher.run().await?;

        println!(
            "Downloaded {} page(s) into {}",
            report.pages_written.len(),
            config.fetch.output_dir.display()
        );

        match report.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn ingest(&self, paths: &[PathBuf], partition_dir: Option<&Path>, raw: bool) -> Result<()> {
        if paths.is_empty() {
            return Err(Error::config("no batch files to ingest"));
        }

        let dir = partition_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.storage.partition_dir.clone());
        let schema = CanonicalSchema::trip_events();
        let store = PartitionStore::new(dir).with_writer_config(self.config.writer_config());
        let ingestor = Ingestor::new(schema.clone(), store)
            .with_run_log(RunLog::new(&self.config.ingest.log_file));

        let partitioner = TemporalPartitioner::new(&schema);
        let transform: Option<&dyn BatchTransform> = if raw { None } else { Some(&partitioner) };

        info!(batches = paths.len(), raw, "Starting ingestion");
        let summary = ingestor.ingest_all(paths, transform);

        println!(
            "Ingested {} of {} batch file(s), {} row(s) appended",
            summary.succeeded.len(),
            paths.len(),
            summary.rows_written()
        );
        for (path, e) in &summary.failed {
            eprintln!("  failed: {}: {e}", path.display());
        }
        for report in &summary.succeeded {
            for partition in report.failed_partitions() {
                if let Err(e) = &partition.outcome {
                    eprintln!(
                        "  partition {} of {}: {e}",
                        partition.target,
                        report.batch.display()
                    );
                }
            }
        }

        if summary.is_clean() {
            Ok(())
        } else {
            Err(Error::Other("ingestion finished with failures".to_string()))
        }
    }

    fn dedup(&self, file: &Path, key: &str) -> Result<()> {
        let report = deduplicate_file(file, key, Some(&self.config.writer_config()))?;
        println!(
            "{}: {} -> {} rows ({} duplicates removed)",
            file.display(),
            report.rows_before,
            report.rows_after,
            report.removed()
        );
        Ok(())
    }

    fn split(&self, file: &Path, parts: usize, remove_source: bool) -> Result<()> {
        let outputs = split_file(
            file,
            parts,
            remove_source,
            Some(&self.config.writer_config()),
        )?;
        for output in outputs {
            println!("{}", output.display());
        }
        Ok(())
    }

    fn pad_names(&self, dir: &Path, start: u64, end: u64, width: usize) -> Result<()> {
        let renamed = normalize_page_filenames(dir, start, end, width)?;
        println!("Renamed {} file(s) in {}", renamed.len(), dir.display());
        Ok(())
    }
}

/// Explicit files first, then the page range under `input_dir`
fn resolve_batches(
    files: &[PathBuf],
    input_dir: Option<&Path>,
    first_page: Option<u64>,
    last_page: Option<u64>,
) -> Result<Vec<PathBuf>> {
    let mut paths = files.to_vec();
    match (input_dir, first_page, last_page) {
        (Some(dir), Some(first), Some(last)) => paths.extend(batch_paths(dir, first, last)),
        (Some(_), _, _) => {
            return Err(Error::config(
                "--input-dir requires --first-page and --last-page",
            ))
        }
        (None, Some(_), _) | (None, _, Some(_)) => {
            return Err(Error::config("--first-page/--last-page require --input-dir"))
        }
        (None, None, None) => {}
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_ingest_range() {
        let cli = Cli::parse_from([
            "taxi-trips",
            "--verbose",
            "ingest",
            "--input-dir",
            "pages",
            "--first-page",
            "1",
            "--last-page",
            "3",
            "--raw",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Ingest {
                input_dir,
                first_page,
                last_page,
                raw,
                ..
            } => {
                assert_eq!(input_dir, Some(PathBuf::from("pages")));
                assert_eq!(first_page, Some(1));
                assert_eq!(last_page, Some(3));
                assert!(raw);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_maintenance_commands() {
        let cli = Cli::parse_from(["taxi-trips", "dedup", "part.parquet"]);
        assert!(matches!(cli.command, Commands::Dedup { ref key, .. } if key == "trip_id"));

        let cli = Cli::parse_from(["taxi-trips", "split", "part.parquet", "--parts", "3"]);
        assert!(matches!(cli.command, Commands::Split { parts: 3, remove_source: false, .. }));

        let cli = Cli::parse_from([
            "taxi-trips", "pad-names", "--dir", "pages", "--start", "1", "--end", "9",
        ]);
        assert!(matches!(cli.command, Commands::PadNames { width: 5, .. }));
    }

    #[test]
    fn test_log_level_from_flags() {
        let runner = Runner::new(Cli::parse_from(["taxi-trips", "dedup", "x.parquet"])).unwrap();
        assert_eq!(runner.log_level(), tracing::Level::INFO);

        let runner =
            Runner::new(Cli::parse_from(["taxi-trips", "-v", "dedup", "x.parquet"])).unwrap();
        assert_eq!(runner.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_resolve_batches() {
        let files = vec![PathBuf::from("a.json")];
        assert_eq!(
            resolve_batches(&files, None, None, None).unwrap(),
            files
        );
        assert!(resolve_batches(&[], Some(Path::new("pages")), None, None).is_err());
        assert!(resolve_batches(&[], None, Some(1), Some(2)).is_err());
    }
}
