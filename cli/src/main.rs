//! docparam CLI - Word document parameter extraction and application
//!
//! A command-line tool for reading the formatting of DOCX files into a JSON
//! parameter schema and writing such schemas back into documents.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use docparam::render::{to_json, JsonFormat};
use docparam::{
    ApplyOptions, Category, Document, ExtractOptions, Extraction, ParameterSchema, Phase, Session,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Word document formatting to and from JSON parameter schemas
#[derive(Parser)]
#[command(
    name = "docparam",
    version,
    about = "Extract and apply Word document parameters",
    long_about = "docparam - Bidirectional parameter schema engine for DOCX files.\n\n\
                  Extracts properties, page setup, styles, numbering, headers, footers and\n\
                  table structure to JSON, and applies such JSON to new or existing documents."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the parameter schema of a document
    Extract {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only styles in use and their ancestors
        #[arg(long)]
        compact: bool,

        /// Include built-in styles the document does not define
        #[arg(long)]
        all_styles: bool,

        /// Include table cell text
        #[arg(long)]
        cells: bool,

        /// Restrict to categories (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        category: Vec<Category>,

        /// JSON layout
        #[arg(long, default_value = "pretty")]
        format: OutputFormat,
    },

    /// Apply a parameter schema to a document
    Apply {
        /// Schema file (JSON)
        schema: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Document to start from (default: a new document)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Skip table parameters
        #[arg(long)]
        no_tables: bool,

        /// Validate and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Create a new document with the house style
    Create {
        /// Output file path
        output: PathBuf,

        /// Document title
        #[arg(long)]
        title: Option<String>,
    },

    /// Set a core property in place
    SetCore {
        /// Document path
        input: PathBuf,

        /// Property name (title, author, revision, ...)
        name: String,

        /// New value
        value: String,
    },

    /// Set a custom property in place
    SetCustom {
        /// Document path
        input: PathBuf,

        /// Property name
        name: String,

        /// New value
        value: String,

        /// Value type: string, number, boolean or datetime
        #[arg(short = 't', long = "type", default_value = "string")]
        kind: String,
    },

    /// Show headings, paragraphs and table count
    Structure {
        /// Input file path
        input: PathBuf,

        /// Print the outline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve JSON requests over stdin/stdout, one per line
    Serve,

    /// Show version information
    Version,
}

/// JSON layout
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Indented JSON
    Pretty,
    /// Single-line JSON
    Compact,
}

impl From<OutputFormat> for JsonFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Pretty => JsonFormat::Pretty,
            OutputFormat::Compact => JsonFormat::Compact,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Extract {
            input,
            output,
            compact,
            all_styles,
            cells,
            category,
            format,
        } => {
            let pb = create_spinner("Reading document...");

            let doc = Document::open(&input)?;
            pb.set_message("Extracting parameters...");

            let mut options = ExtractOptions::new()
                .with_compact(compact)
                .with_all_styles(all_styles)
                .with_cell_text(cells);
            if !category.is_empty() {
                options = options.with_categories(category);
            }

            let source = input.to_string_lossy().into_owned();
            let extraction = Extraction::run(&doc, Some(source), &options)?;
            let json = to_json(&extraction, format.into())?;

            pb.finish_and_clear();
            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                println!(
                    "{} Extracted {} categories to {}",
                    "✓".green().bold(),
                    extraction.parameters.categories().len(),
                    path.display()
                );
            }
        }

        Commands::Apply {
            schema,
            output,
            input,
            no_tables,
            dry_run,
        } => {
            let pb = create_spinner("Loading schema...");

            let json = fs::read_to_string(&schema)?;
            let parameters = ParameterSchema::from_json(&json)?;
            let mut doc = match &input {
                Some(path) => {
                    pb.set_message("Reading document...");
                    Document::open(path)?
                }
                None => Document::new(),
            };

            pb.set_message("Applying parameters...");
            let options = ApplyOptions::new()
                .with_tables(!no_tables)
                .with_dry_run(dry_run);
            let report = docparam::apply(&parameters, &mut doc, &options)?;

            if !dry_run {
                pb.set_message("Writing document...");
                doc.save(&output)?;
            }
            pb.finish_and_clear();

            println!("{}", "Apply Report".cyan().bold());
            println!("{}", "─".repeat(40));
            for phase in Phase::ALL {
                println!("{}: {}", phase.to_string().bold(), report.count(phase));
            }

            if dry_run {
                println!(
                    "\n{} Dry run: {} items would be written",
                    "!".yellow().bold(),
                    report.total()
                );
            } else {
                println!(
                    "\n{} Applied {} items to {}",
                    "✓".green().bold(),
                    report.total(),
                    output.display()
                );
            }
        }

        Commands::Create { output, title } => {
            let mut doc = docparam::content::create_document()?;
            if let Some(title) = title {
                docparam::set_core_property(&mut doc, "title", &title)?;
            }
            doc.save(&output)?;
            println!("{} Created {}", "✓".green().bold(), output.display());
        }

        Commands::SetCore { input, name, value } => {
            let mut doc = Document::open(&input)?;
            docparam::set_core_property(&mut doc, &name, &value)?;
            doc.save(&input)?;
            println!("{} Set {} = {}", "✓".green().bold(), name.bold(), value);
        }

        Commands::SetCustom {
            input,
            name,
            value,
            kind,
        } => {
            let mut doc = Document::open(&input)?;
            docparam::set_custom_property(&mut doc, &name, &value, &kind)?;
            doc.save(&input)?;
            println!(
                "{} Set {} = {} ({})",
                "✓".green().bold(),
                name.bold(),
                value,
                kind
            );
        }

        Commands::Structure { input, json } => {
            let doc = Document::open(&input)?;
            let structure = docparam::content::document_structure(&doc);

            if json {
                println!("{}", serde_json::to_string_pretty(&structure)?);
                return Ok(());
            }

            println!("{}", "Document Structure".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Paragraphs".bold(), doc.paragraph_count());
            println!("{}: {}", "Tables".bold(), structure.tables_count);

            if !structure.headings.is_empty() {
                println!("\n{}", "Headings".cyan().bold());
                println!("{}", "─".repeat(40));
                for heading in &structure.headings {
                    println!("[{}] {}: {}", heading.index, heading.level.bold(), heading.text);
                }
            }
        }

        Commands::Serve => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            let mut session = Session::new();
            session.serve(stdin.lock(), stdout.lock())?;
            log::info!("input closed with {} open documents", session.len());
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn print_version() {
    println!("{} {}", "docparam".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Bidirectional parameter schema engine for Word documents");
    println!();
    println!(
        "Categories: {}",
        Category::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_categories() {
        let cli = Cli::try_parse_from([
            "docparam",
            "extract",
            "in.docx",
            "--category",
            "styles,headers-footers",
            "--format",
            "compact",
        ])
        .unwrap();
        match cli.command {
            Commands::Extract { category, .. } => {
                assert_eq!(category, vec![Category::Styles, Category::HeadersFooters]);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn test_set_custom_type_flag() {
        let cli =
            Cli::try_parse_from(["docparam", "set-custom", "a.docx", "Pages", "3", "--type", "number"])
                .unwrap();
        match cli.command {
            Commands::SetCustom { kind, .. } => assert_eq!(kind, "number"),
            _ => panic!("expected set-custom"),
        }
    }
}
