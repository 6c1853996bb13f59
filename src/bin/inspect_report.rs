use psxscraper::{
    dispatch::extract_report,
    report::{locate_sections, PdfReport, ReportDocument, Section},
    Config,
};
use std::{env, path::Path, process::exit};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    // Expect exactly one CLI argument: path to a quotation PDF.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <REPORT_PDF>", args[0]);
        exit(1);
    }
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, || inspect_report(Path::new(&args[1])));
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

/// Print where each section was found and the shape of its rebuilt table.
fn inspect_report(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let report = PdfReport::open(path)?;
    println!("=== Report: {} ===", path.display());
    println!("Pages:         {}", report.page_count());
    println!(
        "Created:       {}",
        report.creation_date().unwrap_or_else(|| "<unknown>".into())
    );
    println!();

    println!("=== Sections ===");
    let index = locate_sections(&report, &Section::ALL)?;
    for section in Section::ALL {
        println!("- {:<52} | pages: {:?}", section.header(), index.pages(section));
    }
    println!();

    println!("=== Tables ===");
    let exchange_id = Config::default().exchange_id;
    for (section, table) in extract_report(&report, &exchange_id)? {
        println!(
            "- {:<20} | rows: {:<5} | columns: {}",
            section.slug(),
            table.len(),
            table.width()
        );
        println!("    {}", table.headers.join(" | "));
    }
    Ok(())
}
