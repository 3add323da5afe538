use anyhow::Result;
use comfy_table::{Cell, Color, Table};

use timdex_cli::pipeline::{TransformOptions, TransformResult, load_registry, run_transform};
use timdex_output::OutputFormat;
use timdex_transform::RunType;

use crate::cli::{OutputFormatArg, RunTypeArg, SourcesArgs, TransformArgs};
use crate::summary::{apply_table_style, header_cell};

pub fn run_transform_command(args: &TransformArgs) -> Result<TransformResult> {
    let options = TransformOptions {
        input_file: args.input_file.clone(),
        output_location: args.output_location.clone(),
        source: args.source.clone(),
        run_id: args.run_id.clone(),
        run_timestamp: args.run_timestamp,
        run_date: args.run_date,
        run_type: args.run_type.map(|run_type| match run_type {
            RunTypeArg::Full => RunType::Full,
            RunTypeArg::Daily => RunType::Daily,
            RunTypeArg::Incremental => RunType::Incremental,
        }),
        exclusion_list: args.exclusion_list.clone(),
        sources: args.sources.clone(),
        format: match args.format {
            OutputFormatArg::Parquet => OutputFormat::Parquet,
            OutputFormatArg::Jsonl => OutputFormat::JsonLines,
        },
    };
    run_transform(&options)
}

pub fn run_sources(args: &SourcesArgs) -> Result<()> {
    let registry = load_registry(args.sources.as_deref())?;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Name"),
        header_cell("Extractor"),
        header_cell("Base URL"),
    ]);
    apply_table_style(&mut table);
    for (code, entry) in registry.iter() {
        let extractor = if entry.extractor.is_supported() {
            Cell::new(entry.extractor)
        } else {
            Cell::new(format!("{} (unavailable)", entry.extractor)).fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(code),
            Cell::new(&entry.name),
            extractor,
            Cell::new(&entry.base_url),
        ]);
    }
    println!("{table}");
    Ok(())
}
