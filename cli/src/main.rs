//! folio CLI - document assembly tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use folio::parser::load_properties;
use folio::{Assembler, Assembly, JsonFormat, JsonRenderer, ParseOptions, Renderer, SectionKind};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Assemble documents from a TOC of content fragments", long_about = None)]
struct Cli {
    /// TOC files to check (shorthand for `folio check`)
    #[arg(value_name = "TOC")]
    inputs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble TOC files and write the document model as JSON
    Assemble {
        /// TOC files
        #[arg(value_name = "TOC", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (next to each TOC if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        assembly: AssemblyArgs,
    },

    /// Assemble TOC files and report dangling links
    Check {
        /// TOC files
        #[arg(value_name = "TOC", required = true)]
        inputs: Vec<PathBuf>,

        /// Treat link warnings as failures
        #[arg(long)]
        strict: bool,

        /// Print warnings as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        assembly: AssemblyArgs,
    },

    /// Show the structure of an assembled document
    Info {
        /// TOC file
        #[arg(value_name = "TOC")]
        input: PathBuf,

        #[command(flatten)]
        assembly: AssemblyArgs,
    },

    /// Show version information
    Version,
}

/// Options shared by every command that assembles documents.
#[derive(Args, Clone, Default)]
struct AssemblyArgs {
    /// Extension for fragment names without one
    #[arg(long = "ext", value_name = "EXT", env = "FOLIO_DEFAULT_EXTENSION")]
    default_extension: Option<String>,

    /// Property file loaded before the TOC's own properties
    #[arg(long, value_name = "FILE")]
    properties: Option<PathBuf>,

    /// Metadata entry (`key=value`), may be repeated
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    define: Vec<(String, String)>,

    /// Base URL for relative repository paths (the TOC's directory by default)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
}

impl AssemblyArgs {
    fn assembler(&self) -> Result<Assembler, Box<dyn std::error::Error>> {
        let mut options = ParseOptions::new();
        if let Some(ext) = &self.default_extension {
            options = options.with_default_extension(ext.as_str());
        }
        if let Some(path) = &self.properties {
            options = options.with_properties(load_properties(path)?);
        }
        options = options.with_properties(self.define.iter().cloned());
        if let Some(url) = &self.base_url {
            let url = url::Url::parse(url)
                .map_err(|e| format!("Invalid base URL '{}': {}", url, e))?;
            options = options.with_base_url(url);
        }
        Ok(Assembler::with_options(options))
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Assemble {
            inputs,
            output,
            compact,
            assembly,
        }) => cmd_assemble(&inputs, output.as_deref(), compact, &assembly),
        Some(Commands::Check {
            inputs,
            strict,
            json,
            assembly,
        }) => cmd_check(&inputs, strict, json, &assembly),
        Some(Commands::Info { input, assembly }) => cmd_info(&input, &assembly),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: check if inputs are provided
            if cli.inputs.is_empty() {
                println!("{}", "Usage: folio <TOC>...".yellow());
                println!("       folio --help for more information");
                Ok(())
            } else {
                cmd_check(&cli.inputs, false, false, &AssemblyArgs::default())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

fn output_path(input: &Path, output_dir: Option<&Path>, extension: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let file_name = format!("{}.{}", stem, extension);
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

fn cmd_assemble(
    inputs: &[PathBuf],
    output: Option<&Path>,
    compact: bool,
    args: &AssemblyArgs,
) -> CliResult {
    let assembler = args.assembler()?;
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let renderer = JsonRenderer::new(format);

    if let Some(dir) = output {
        fs::create_dir_all(dir)?;
    }

    let pb = progress_bar(inputs.len());
    let mut written = Vec::new();
    let mut failures = 0;

    for input in inputs {
        pb.set_message(input.display().to_string());
        match assembler.assemble_file(input) {
            Ok(assembly) => {
                let path = output_path(input, output, renderer.extension());
                fs::write(&path, renderer.render(&assembly.document)?)?;
                written.push((path, assembly.warnings.len()));
            }
            Err(e) => {
                pb.println(format!("{} {}", "Failed".red().bold(), e));
                failures += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    if !written.is_empty() {
        println!("\n{}", "Output files:".green().bold());
        for (i, (path, warnings)) in written.iter().enumerate() {
            let branch = if i + 1 == written.len() { "└─" } else { "├─" };
            let note = if *warnings > 0 {
                format!(" ({} link warnings)", warnings).yellow().to_string()
            } else {
                String::new()
            };
            println!("  {} {}{}", branch.dimmed(), path.display(), note);
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} documents failed", failures, inputs.len()).into());
    }
    Ok(())
}

fn cmd_check(inputs: &[PathBuf], strict: bool, json: bool, args: &AssemblyArgs) -> CliResult {
    let assembler = args.assembler()?;
    let mut failures = 0;
    let mut warned = 0;

    for (input, result) in assembler.assemble_batch(inputs) {
        match result {
            Ok(assembly) => {
                if !assembly.is_clean() {
                    warned += 1;
                }
                if json {
                    println!("{}", serde_json::to_string(&assembly.warnings)?);
                } else {
                    report_warnings(&input, &assembly);
                }
            }
            Err(e) => {
                eprintln!("{} {}", "Failed".red().bold(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} documents failed", failures, inputs.len()).into());
    }
    if strict && warned > 0 {
        return Err(format!("{} documents have link warnings", warned).into());
    }
    Ok(())
}

fn report_warnings(input: &Path, assembly: &Assembly) {
    if assembly.is_clean() {
        println!("{} {}", "OK".green().bold(), input.display());
        return;
    }
    println!(
        "{} {} ({} warnings)",
        "WARN".yellow().bold(),
        input.display(),
        assembly.warnings.len()
    );
    for warning in &assembly.warnings {
        println!("  {} {}", "-".dimmed(), warning);
    }
}

fn cmd_info(input: &Path, args: &AssemblyArgs) -> CliResult {
    let assembly = args.assembler()?.assemble_file(input)?;
    let doc = &assembly.document;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Base name".bold(), doc.toc_base_name);
    if let Some(ref title) = doc.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(version) = doc.metadata.get(folio::parser::VERSION_KEY) {
        println!("{}: {}", "TOC version".bold(), version);
    }
    println!("{}: {}", "Metadata entries".bold(), doc.metadata.len());
    if !doc.style_sheets.is_empty() {
        println!("{}: {}", "Stylesheets".bold(), doc.style_sheets.join(", "));
    }

    println!();
    println!("{}", "Repositories".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for repo in doc.repos.iter() {
        println!("{}: {}", repo.id.bold(), repo.base_uri);
    }

    println!();
    println!("{}", "Sections".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for section in doc.all_sections() {
        let detail = match section.kind() {
            SectionKind::Content => {
                let chapters = section.as_content().map_or(0, |s| s.chapters.len());
                format!("{} chapters", chapters)
            }
            SectionKind::Meta => {
                let elements = section.elements().map_or(0, <[_]>::len);
                format!("{} elements", elements)
            }
            SectionKind::Pseudo | SectionKind::Header => section
                .as_generated()
                .map(|s| format!("generated by '{}'", s.generator))
                .unwrap_or_default(),
        };
        println!(
            "{} {} {} {}",
            "•".dimmed(),
            section.name().bold(),
            format!("[{:?}]", section.kind()).dimmed(),
            detail
        );
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Sections".bold(), doc.section_count());
    println!("{}: {}", "Chapters".bold(), doc.chapter_count());
    let filters: Vec<_> = doc.post_processors.iter().map(|(name, _)| name.as_str()).collect();
    if !filters.is_empty() {
        println!("{}: {}", "Extra post-processors".bold(), filters.join(", "));
    }
    println!("{}: {}", "Link warnings".bold(), assembly.warnings.len());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "folio".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document assembly tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/folio".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("edition=2=b").unwrap(),
            ("edition".to_string(), "2=b".to_string())
        );
        assert!(parse_key_val("edition").is_err());
        assert!(parse_key_val(" =x").is_err());
    }

    #[test]
    fn test_output_path() {
        let input = Path::new("docs/manual.xml");
        assert_eq!(
            output_path(input, None, "json"),
            PathBuf::from("docs/manual.json")
        );
        assert_eq!(
            output_path(input, Some(Path::new("out")), "json"),
            PathBuf::from("out/manual.json")
        );
    }

    #[test]
    fn test_assemble_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let toc = dir.path().join("book.xml");
        fs::write(&toc, r#"<document><header title="Book"/></document>"#).unwrap();
        let out = dir.path().join("out");

        cmd_assemble(&[toc], Some(out.as_path()), true, &AssemblyArgs::default()).unwrap();

        let json = fs::read_to_string(out.join("book.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["title"], "Book");
        assert_eq!(value["stage"], "generated");
    }
}
