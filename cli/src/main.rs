mod config;
mod report;

use std::path::Path;
use std::process;

use clap::{Parser as ClapParser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use config::Config;
use doctest::parser::Parser;

const SUBCOMMANDS: &[&str] = &["verify", "extract", "help"];

#[derive(ClapParser)]
#[command(name = "doctest", version, about = "Doctest runner for structured docstrings")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to a doctest.toml configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify the example blocks of a file or directory tree
    Verify(VerifyArgs),

    /// Extract and inspect example blocks without running them
    Extract(ExtractArgs),
}

#[derive(clap::Args)]
struct VerifyArgs {
    /// A source file, text file, or a directory to search
    path: String,

    /// Verify only blocks under these sections (e.g. EXAMPLES). Repeatable.
    #[arg(short, long)]
    section: Vec<String>,

    /// List available sections and exit
    #[arg(long)]
    list_sections: bool,
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// File to extract blocks from
    file: String,

    /// Parse only, don't list (exit 0 if the file scans cleanly)
    #[arg(long)]
    check: bool,

    /// Dump the extracted suite
    #[arg(long)]
    dump: bool,
}

fn main() {
    // Backwards compatibility: if the first positional arg is not a known
    // subcommand, inject "verify" so `doctest file.py` works like
    // `doctest verify file.py`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(first_pos) = args.iter().skip(1).find(|a| !a.starts_with('-')) {
        let first_pos = first_pos.clone();
        if !SUBCOMMANDS.contains(&first_pos.as_str()) {
            let pos = args.iter().position(|a| *a == first_pos).unwrap();
            args.insert(pos, "verify".to_string());
        }
    }

    let cli = Cli::parse_from(&args);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Command::Verify(verify_args) => {
            let syntax = config.syntax();
            let path = Path::new(&verify_args.path);
            if verify_args.list_sections {
                report::list_sections(path, &syntax);
                return;
            }
            let sections = if verify_args.section.is_empty() {
                config.sections.clone()
            } else {
                verify_args.section.clone()
            };
            let exit_code = report::run_verify(path, cli.no_color, &sections, &syntax);
            process::exit(exit_code);
        }
        Command::Extract(extract_args) => do_extract(extract_args, &config, cli.no_color),
    }
}

fn do_extract(args: ExtractArgs, config: &Config, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let parser = Parser::new(source, file_id).with_syntax(config.syntax());
    let is_source = Path::new(&args.file)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| matches!(ext, "py" | "pyx"));
    let suite = if is_source {
        match parser.parse_source() {
            Ok(s) => s,
            Err(error) => {
                let writer = StandardStream::stderr(color_choice);
                let term_config = term::Config::default();
                let _ = term::emit_to_write_style(
                    &mut writer.lock(),
                    &term_config,
                    &files,
                    &error.to_diagnostic(),
                );
                process::exit(1);
            }
        }
    } else {
        parser.parse_comment()
    };

    // --check: scanning succeeded, report structural problems and exit.
    if args.check {
        let writer = StandardStream::stderr(color_choice);
        let term_config = term::Config::default();
        let mut bad = 0usize;
        for comment in &suite.comments {
            for block in &comment.blocks {
                if let Some(error) = &block.error {
                    let _ = term::emit_to_write_style(
                        &mut writer.lock(),
                        &term_config,
                        &files,
                        &error.to_diagnostic(),
                    );
                    bad += 1;
                }
            }
        }
        if bad == 0 {
            eprintln!(
                "ok: {} ({} comments, {} blocks, {} statements)",
                args.file,
                suite.comments.len(),
                suite.block_count(),
                suite.statement_count()
            );
        } else {
            process::exit(1);
        }
        return;
    }

    // --dump: debug-print the whole suite.
    if args.dump {
        println!("{:#?}", suite);
        return;
    }

    // Default: list comments with their blocks.
    for comment in &suite.comments {
        println!(
            "{} (line {}): {} blocks",
            comment.label(),
            comment.line,
            comment.blocks.len()
        );
        for block in &comment.blocks {
            let section = block.section.as_deref().unwrap_or("(none)");
            let status = if block.is_malformed() {
                " [malformed]"
            } else {
                ""
            };
            println!(
                "  line {:<4} {:<10} {} statements{}",
                block.line,
                section,
                block.statements.len(),
                status
            );
        }
    }
}
