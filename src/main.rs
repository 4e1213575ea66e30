//! Site Composer CLI
//!
//! Usage:
//!   site-composer lint <MANIFEST> [--public-only]
//!   site-composer build <MANIFEST>
//!   site-composer schema <MANIFEST> <TEMPLATE> [--dot]
//!   site-composer templates <MANIFEST> [--category <NAME>]
//!
//! Logs go to stderr; set `RUST_LOG` to raise the level above `warn`.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use site_composer::reconcile::dot_record;
use site_composer::{build_site, lint_manifest, schema_to_simple_tree, Manifest};

#[derive(Parser)]
#[command(name = "site-composer")]
#[command(about = "Compose card-based sites and check template options against their schemas")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report drift between template options and schemas
    Lint {
        /// Manifest file (TOML)
        manifest: PathBuf,

        /// Only check templates offered to site authors
        #[arg(long)]
        public_only: bool,
    },

    /// Build the site and print it as JSON
    Build {
        /// Manifest file (TOML)
        manifest: PathBuf,
    },

    /// Print a template's schema
    Schema {
        /// Manifest file (TOML)
        manifest: PathBuf,

        /// Template id
        template: String,

        /// Print flat dot-paths instead of the nested tree
        #[arg(long)]
        dot: bool,
    },

    /// List registered templates as JSON
    Templates {
        /// Manifest file (TOML)
        manifest: PathBuf,

        /// Only list templates in this category
        #[arg(long)]
        category: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Lint {
            manifest,
            public_only,
        } => {
            let (source, parsed) = load(&manifest);
            let filename = manifest.display().to_string();
            let lints = match lint_manifest(&parsed, &source, &filename, public_only).await {
                Ok(lints) => lints,
                Err(e) => fail(&e),
            };

            let drifting: Vec<_> = lints.iter().filter(|l| !l.is_clean()).collect();
            for lint in &drifting {
                eprint!("{}", lint.report);
            }
            if !drifting.is_empty() {
                eprintln!(
                    "{} of {} templates drift from their schema",
                    drifting.len(),
                    lints.len()
                );
                std::process::exit(1);
            }
            eprintln!("{} templates checked, no drift", lints.len());
        }
        Command::Build { manifest } => {
            let (_, parsed) = load(&manifest);
            let site = match build_site(&parsed).await {
                Ok(site) => site,
                Err(e) => fail(&e),
            };
            match serde_json::to_string_pretty(&site) {
                Ok(json) => println!("{}", json),
                Err(e) => fail(&e),
            }
        }
        Command::Schema {
            manifest,
            template,
            dot,
        } => {
            let (_, parsed) = load(&manifest);
            let schema = match site_composer::template_schema(&parsed, &template).await {
                Ok(Some(schema)) => schema,
                Ok(None) => {
                    eprintln!("Template '{}' declares no schema", template);
                    std::process::exit(1);
                }
                Err(e) => fail(&e),
            };
            if dot {
                print!("{}", dot_record(&schema));
            } else {
                match serde_json::to_string_pretty(&schema_to_simple_tree(&schema)) {
                    Ok(json) => println!("{}", json),
                    Err(e) => fail(&e),
                }
            }
        }
        Command::Templates { manifest, category } => {
            let (_, parsed) = load(&manifest);
            let catalog = parsed.registry().catalog(category.as_deref());
            match serde_json::to_string_pretty(&catalog) {
                Ok(json) => println!("{}", json),
                Err(e) => fail(&e),
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> (String, Manifest) {
    let source = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    };
    match Manifest::from_str(&source) {
        Ok(manifest) => (source, manifest),
        Err(e) => {
            eprintln!("Error loading manifest '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn fail(err: &dyn std::fmt::Display) -> ! {
    eprintln!("Error: {}", err);
    std::process::exit(1);
}
