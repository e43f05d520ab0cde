//! Command-line front end for the feed generator
//!
//! ```text
//! cargo run --example cli_tool -- inventory.xlsx feed.xml
//! cargo run --example cli_tool -- inventory.json - --stdout --output-json
//! cargo run --example cli_tool -- verify feed.xml
//! ```
//!
//! Log output goes to stderr and is controlled by `RUST_LOG`
//! (default `info`).

use adfeed::{
    verify_feed, FeedConfig, FeedError, FeedGeneratorBuilder, FeedReport, InputFormat,
    OutputFormat, SheetSelector,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

struct Options {
    config: Option<String>,
    sheet: Option<SheetSelector>,
    currency: Option<String>,
    output_json: bool,
    parallel: bool,
    report: Option<String>,
    use_stdout: bool,
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <input.xlsx|input.json> <output.xml> [options]", program);
    eprintln!("       {} verify <feed.xml>", program);
    eprintln!("\nOptions:");
    eprintln!("  --config <file>      Load settings from a JSON configuration file");
    eprintln!("  --sheet-index <n>    Select sheet by index (0-based)");
    eprintln!("  --sheet-name <name>  Select sheet by name");
    eprintln!("  --currency <code>    Literal for the {{{{currency}}}} tag");
    eprintln!("  --output-json        Write listings and statistics as JSON");
    eprintln!("  --parallel           Process records on all cores");
    eprintln!("  --report <file>      Write the run report (JSON) to a file");
    eprintln!("  --stdout             Write output to stdout instead of file");
    eprintln!("\nExamples:");
    eprintln!("  {} inventory.xlsx feed.xml", program);
    eprintln!("  {} inventory.xlsx feed.xml --sheet-name \"Listings\"", program);
    eprintln!("  {} inventory.json - --stdout", program);
    process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        usage(&args[0]);
    }

    if args[1] == "verify" {
        match verify(&args[2]) {
            Ok(true) => println!("{} is valid", args[2]),
            Ok(false) => process::exit(2),
            Err(e) => {
                handle_error(e);
                process::exit(1);
            }
        }
        return;
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let options = parse_options(&args);

    match generate(input_path, output_path, &options) {
        Ok(report) => {
            if !options.use_stdout {
                println!("Feed written: {} -> {}", input_path, output_path);
            }
            eprintln!(
                "{} listings, {} skipped, {} inactive ({} records)",
                report.stats.processed_count,
                report.stats.skipped_count,
                report.stats.inactive_count,
                report.stats.total_records
            );
            for skipped in &report.stats.errors {
                eprintln!("  {}", skipped.reason);
            }
        }
        Err(e) => {
            handle_error(e);
            process::exit(1);
        }
    }
}

fn parse_options(args: &[String]) -> Options {
    let mut options = Options {
        config: None,
        sheet: None,
        currency: None,
        output_json: false,
        parallel: false,
        report: None,
        use_stdout: args[2] == "-",
    };

    let value = |i: usize| -> String {
        match args.get(i + 1) {
            Some(v) => v.clone(),
            None => {
                eprintln!("Error: {} requires a value", args[i]);
                process::exit(1);
            }
        }
    };

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                options.config = Some(value(i));
                i += 2;
            }
            "--sheet-index" => {
                let raw = value(i);
                let index = raw.parse::<usize>().unwrap_or_else(|_| {
                    eprintln!("Error: Invalid sheet index: {}", raw);
                    process::exit(1);
                });
                options.sheet = Some(SheetSelector::Index(index));
                i += 2;
            }
            "--sheet-name" => {
                options.sheet = Some(SheetSelector::Name(value(i)));
                i += 2;
            }
            "--currency" => {
                options.currency = Some(value(i));
                i += 2;
            }
            "--report" => {
                options.report = Some(value(i));
                i += 2;
            }
            "--output-json" => {
                options.output_json = true;
                i += 1;
            }
            "--parallel" => {
                options.parallel = true;
                i += 1;
            }
            "--stdout" => {
                options.use_stdout = true;
                i += 1;
            }
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
    }

    options
}

fn generate(input_path: &str, output_path: &str, options: &Options) -> Result<FeedReport, FeedError> {
    let config = match &options.config {
        Some(path) => FeedConfig::from_path(path)?,
        None => FeedConfig::default(),
    };

    let mut builder = FeedGeneratorBuilder::new().with_config(config);
    if let Some(sheet) = &options.sheet {
        builder = builder.with_sheet_selector(sheet.clone());
    }
    if let Some(currency) = &options.currency {
        builder = builder.with_currency(currency.as_str());
    }
    if options.output_json {
        builder = builder.with_output_format(OutputFormat::Json);
    }
    if options.parallel {
        builder = builder.parallel(true);
    }
    let generator = builder.build()?;

    let format = match Path::new(input_path).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
        _ => InputFormat::Xlsx,
    };
    let input = File::open(input_path)?;

    let report = if options.use_stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let report = generator.generate(input, format, &mut handle)?;
        handle.flush()?;
        report
    } else {
        generator.generate(input, format, File::create(output_path)?)?
    };

    if let Some(report_path) = &options.report {
        let file = File::create(report_path)?;
        serde_json::to_writer_pretty(file, &report)?;
    }

    Ok(report)
}

fn verify(path: &str) -> Result<bool, FeedError> {
    let xml = std::fs::read(path)?;
    let report = verify_feed(&xml)?;

    for issue in &report.issues {
        eprintln!("{}", issue);
    }
    eprintln!("{} ads checked, {} issues", report.ad_count, report.issues.len());
    Ok(report.is_valid())
}

fn handle_error(error: FeedError) {
    match error {
        FeedError::Io(io_err) => {
            eprintln!("I/O Error: {}", io_err);
            eprintln!("Please check that the file exists and you have permission to access it.");
        }
        FeedError::Parse(parse_err) => {
            eprintln!("Parse Error: {}", parse_err);
            eprintln!("The file may not be a valid spreadsheet or may be corrupted.");
        }
        FeedError::Json(json_err) => {
            eprintln!("JSON Error: {}", json_err);
            eprintln!("Check the input records or the configuration file.");
        }
        FeedError::Xml(xml_err) => {
            eprintln!("XML Error: {}", xml_err);
        }
        FeedError::Utf8(utf8_err) => {
            eprintln!("UTF-8 Conversion Error: {}", utf8_err);
        }
        FeedError::Config(msg) => {
            eprintln!("Configuration Error: {}", msg);
            eprintln!("Please check your sheet selection and configuration file.");
        }
        FeedError::InvalidInput(msg) => {
            eprintln!("Invalid Input: {}", msg);
            eprintln!("JSON input must be an array of flat objects.");
        }
        FeedError::SecurityViolation(msg) => {
            eprintln!("Security Violation: {}", msg);
            eprintln!("The input violates size limits.");
        }
    }
}
