//! OmniLang Compiler CLI
//!
//! Command-line interface for compiling .omni programs to C, and for
//! dumping the token/AST forms the golden tests use.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{generate, Shell};
use omnic::{CompilerConfig, OptLevel};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "omnic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "OmniLang compiler - compile .omni programs to C", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .omni file to a C source file
    Build {
        /// Input .omni source file
        input: PathBuf,

        /// Output C file (defaults to the input with a .c extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Optimization level: 0, 1, 2, 3, or s
        #[arg(short = 'O', long = "opt", default_value = "0")]
        opt: String,
    },

    /// Compile a .omni file and write the C to stdout
    EmitC {
        /// Input .omni source file
        input: PathBuf,

        /// Optimization level: 0, 1, 2, 3, or s
        #[arg(short = 'O', long = "opt", default_value = "0")]
        opt: String,
    },

    /// Dump the token stream in the canonical golden format
    Tokens {
        /// Input .omni source file
        input: PathBuf,
    },

    /// Dump the parsed AST in the canonical golden format
    Ast {
        /// Input .omni source file
        input: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, opt } => {
            let output = output.unwrap_or_else(|| input.with_extension("c"));
            run_build(&input, &output, &opt);
        }
        Commands::EmitC { input, opt } => run_emit_c(&input, &opt),
        Commands::Tokens { input } => run_dump(&input, omnic::tokens_dump),
        Commands::Ast { input } => run_dump(&input, omnic::ast_dump),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "omnic", &mut io::stdout());
        }
    }
}

fn parse_opt_level(opt: &str) -> OptLevel {
    match opt.parse() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    }
}

fn run_build(input: &Path, output: &Path, opt: &str) {
    let config = CompilerConfig::new().with_opt_level(parse_opt_level(opt));
    match omnic::compile_file(input, output, &config) {
        Ok(()) => {
            println!("Compiled {} -> {}", input.display(), output.display());
        }
        Err(diagnostics) => {
            eprintln!("{}", diagnostics);
            process::exit(1);
        }
    }
}

fn run_emit_c(input: &Path, opt: &str) {
    let config = CompilerConfig::new().with_opt_level(parse_opt_level(opt));
    let source = read_source(input);
    match omnic::compile_source(&input.display().to_string(), &source, &config) {
        Ok(c_text) => print!("{}", c_text),
        Err(diagnostics) => {
            eprintln!("{}", diagnostics);
            process::exit(1);
        }
    }
}

fn run_dump(input: &Path, dump: fn(&str, &str) -> Result<String, String>) {
    let source = read_source(input);
    match dump(&input.display().to_string(), &source) {
        Ok(text) => print!("{}", text),
        Err(diagnostics) => {
            eprintln!("{}", diagnostics);
            process::exit(1);
        }
    }
}

fn read_source(input: &Path) -> String {
    match std::fs::read_to_string(input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", input.display(), e);
            process::exit(1);
        }
    }
}
