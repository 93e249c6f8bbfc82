use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;
use wikimark::{Converter, ConverterOptions, StaticDirectory};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Markdown,
    Jira,
    Storage,
}

#[derive(Parser)]
#[command(
    version,
    about = "Convert documents between Markdown, Jira wiki markup and Confluence storage XML"
)]
struct Cli {
    /// Format of the input documents
    #[arg(long, value_enum)]
    from: Format,
    /// Format to write
    #[arg(long, value_enum)]
    to: Format,
    /// Base URL used when rewriting issue smart links
    #[arg(long = "base-url")]
    base_url: Option<String>,
    /// Space key of storage documents
    #[arg(long = "space-key")]
    space_key: Option<String>,
    /// Known user as ID=NAME; may be repeated
    #[arg(long = "user", value_name = "ID=NAME", value_parser = parse_user)]
    users: Vec<(String, String)>,
    /// Rewrite files in place
    #[arg(long = "in-place", requires = "files")]
    in_place: bool,
    /// Documents to convert; standard input is read when none are given
    files: Vec<PathBuf>,
}

fn parse_user(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((id, name)) if !id.trim().is_empty() => Ok((id.trim().to_string(), name.to_string())),
        _ => Err(format!("expected ID=NAME, got `{arg}`")),
    }
}

fn build_converter(cli: &Cli) -> Converter {
    let mut options = ConverterOptions::default();
    if let Some(url) = &cli.base_url {
        options = options.with_base_url(url);
    }
    if let Some(space) = &cli.space_key {
        options = options.with_space_key(space);
    }
    let converter = Converter::new(options);
    if cli.users.is_empty() {
        return converter;
    }
    let directory: StaticDirectory = cli.users.iter().cloned().collect();
    converter.with_directory(Arc::new(directory))
}

/// Convert `input`; pairs without a direct path go through Markdown.
fn convert(converter: &Converter, from: Format, to: Format, input: &str) -> anyhow::Result<String> {
    let output = match (from, to) {
        (Format::Jira, Format::Markdown) => converter.jira_markup_to_markdown(input),
        (Format::Markdown, Format::Jira) => converter.markdown_to_jira_markup(input),
        (Format::Storage, Format::Markdown) => converter.confluence_storage_to_markdown(input, None).markdown,
        (Format::Markdown, Format::Storage) => converter.markdown_to_confluence_storage(input),
        (Format::Jira, Format::Storage) => {
            converter.markdown_to_confluence_storage(&converter.jira_markup_to_markdown(input))
        }
        (Format::Storage, Format::Jira) => {
            let markdown = converter.confluence_storage_to_markdown(input, None).markdown;
            converter.markdown_to_jira_markup(&markdown)
        }
        (Format::Markdown, Format::Markdown) | (Format::Jira, Format::Jira) | (Format::Storage, Format::Storage) => {
            bail!("--from and --to name the same format ({from:?})")
        }
    };
    Ok(output)
}

/// Entry point for the `wikimark` command-line tool.
///
/// Converts standard input, or each named file, from one format to another.
/// Files are converted in parallel and printed in the order given, or
/// rewritten when `--in-place` is set.
///
/// # Examples
///
/// ```sh
/// # Jira markup from stdin to Markdown
/// echo 'h1. Title' | wikimark --from jira --to markdown
///
/// # Resolve mentions while converting files in place
/// wikimark --from jira --to markdown --user 42='Ada Lovelace' --in-place notes.txt
/// ```
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let converter = build_converter(&cli);

    if cli.files.is_empty() {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        println!("{}", convert(&converter, cli.from, cli.to, &input)?);
        return Ok(());
    }

    let outputs: Vec<anyhow::Result<String>> = cli
        .files
        .par_iter()
        .map(|path| {
            let content =
                fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            convert(&converter, cli.from, cli.to, &content)
        })
        .collect();

    for (path, output) in cli.files.iter().zip(outputs) {
        let output = output?;
        if cli.in_place {
            fs::write(path, output + "\n").with_context(|| format!("failed to write {}", path.display()))?;
        } else {
            println!("{output}");
        }
    }
    Ok(())
}
