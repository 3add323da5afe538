//! One transform run: resolve configuration, stream records through the
//! source's extractor, and write every outcome row to the dataset.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, info_span};

use timdex_ingest::{IngestError, JsonRecords, XmlRecords};
use timdex_output::{DatasetWriter, OutputFormat, WriteSummary, open_writer};
use timdex_sources::{
    ExtractorKind, MitAardvark, MitLibWebsite, OaiDc, SourceEntry, SourceRegistry,
    SpringshareOaiDc,
};
use timdex_transform::{
    ExclusionList, Extractor, RunContext, RunType, SourceContext, TransformStats, Transformer,
};

/// Inputs for a single run. Unset values are derived from the input file
/// name.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub input_file: PathBuf,
    pub output_location: PathBuf,
    pub source: Option<String>,
    pub run_id: Option<String>,
    pub run_timestamp: Option<DateTime<Utc>>,
    pub run_date: Option<NaiveDate>,
    pub run_type: Option<RunType>,
    pub exclusion_list: Option<PathBuf>,
    /// Replacement source registry. The built-in registry is used otherwise.
    pub sources: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Debug)]
pub struct TransformResult {
    pub run: RunContext,
    pub source_name: String,
    pub stats: TransformStats,
    pub output: WriteSummary,
    pub elapsed: Duration,
}

pub fn load_registry(path: Option<&Path>) -> Result<SourceRegistry> {
    match path {
        Some(path) => SourceRegistry::load(path)
            .with_context(|| format!("load source registry {}", path.display())),
        None => SourceRegistry::load_default().context("load built-in source registry"),
    }
}

pub fn run_transform(options: &TransformOptions) -> Result<TransformResult> {
    let started = Instant::now();

    // ===== Stage 1: configuration =====
    let registry = load_registry(options.sources.as_deref())?;
    let run = build_run_context(options)?;
    let span = info_span!("transform", source = %run.source, run_id = %run.run_id);
    let _guard = span.enter();
    let (source, entry) = registry
        .source_context(run.clone())
        .context("resolve source")?;
    let exclusions = match &options.exclusion_list {
        Some(path) => ExclusionList::load(path).context("load exclusion list")?,
        None => ExclusionList::default(),
    };

    info!(
        input_file = %options.input_file.display(),
        source_name = %source.name,
        run_date = %run.run_date_string(),
        run_type = %run.run_type,
        run_timestamp = %run.run_timestamp,
        exclusions = exclusions.len(),
        "starting transform"
    );

    // ===== Stage 2: transform and write =====
    let mut writer = open_writer(options.format, &options.output_location, &run)
        .with_context(|| format!("prepare output {}", options.output_location.display()))?;
    let source_name = source.name.clone();
    let stats = dispatch(&entry, &options.input_file, source, exclusions, writer.as_mut())?;
    let output = writer.finish().context("finish dataset output")?;

    let elapsed = started.elapsed();
    info!(
        processed = stats.processed,
        indexed = stats.indexed,
        deleted = stats.deleted,
        skipped = stats.skipped,
        errored = stats.errored,
        files = output.files.len(),
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "transform complete"
    );

    Ok(TransformResult {
        run,
        source_name,
        stats,
        output,
        elapsed,
    })
}

fn build_run_context(options: &TransformOptions) -> Result<RunContext> {
    let mut builder = RunContext::builder().source_file(&options.input_file);
    if let Some(source) = &options.source {
        builder = builder.source(source);
    }
    if let Some(run_id) = &options.run_id {
        builder = builder.run_id(run_id);
    }
    if let Some(run_timestamp) = options.run_timestamp {
        builder = builder.run_timestamp(run_timestamp);
    }
    if let Some(run_date) = options.run_date {
        builder = builder.run_date(run_date);
    }
    if let Some(run_type) = options.run_type {
        builder = builder.run_type(run_type);
    }
    builder.build().context("build run context")
}

fn dispatch(
    entry: &SourceEntry,
    input: &Path,
    source: SourceContext,
    exclusions: ExclusionList,
    writer: &mut dyn DatasetWriter,
) -> Result<TransformStats> {
    match entry.extractor {
        ExtractorKind::OaiDc => {
            let extractor =
                OaiDc::new().with_invalid_content_types(&entry.invalid_content_types);
            drive(extractor, source, xml_records(input, entry)?, exclusions, writer)
        }
        ExtractorKind::SpringshareOaiDc => drive(
            SpringshareOaiDc::new(),
            source,
            xml_records(input, entry)?,
            exclusions,
            writer,
        ),
        ExtractorKind::MitLibWebsite => {
            drive(MitLibWebsite, source, json_records(input)?, exclusions, writer)
        }
        ExtractorKind::MitAardvark => {
            drive(MitAardvark, source, json_records(input)?, exclusions, writer)
        }
        other => bail!("no extractor available for '{other}'"),
    }
}

fn xml_records(
    input: &Path,
    entry: &SourceEntry,
) -> Result<XmlRecords<std::io::BufReader<std::fs::File>>> {
    let records = XmlRecords::open(input).context("open source file")?;
    Ok(match &entry.record_tag {
        Some(tag) => records.with_record_tag(tag),
        None => records,
    })
}

fn json_records(input: &Path) -> Result<JsonRecords<std::io::BufReader<std::fs::File>>> {
    JsonRecords::open(input).context("open source file")
}

fn drive<E, I>(
    extractor: E,
    source: SourceContext,
    records: I,
    exclusions: ExclusionList,
    writer: &mut dyn DatasetWriter,
) -> Result<TransformStats>
where
    E: Extractor,
    I: Iterator<Item = Result<E::Record, IngestError>>,
{
    let mut transformer = Transformer::new(extractor, source, records).with_exclusions(exclusions);
    for row in transformer.by_ref() {
        let row = row.context("read source records")?;
        writer.write(row).context("write dataset row")?;
    }
    Ok(*transformer.stats())
}
