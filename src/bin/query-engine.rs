//! Thin CLI front-end: `query-engine index lexicon page_table doc_lengths`,
//! then a stdin prompt loop of `query` / `AND|OR` pairs until `exit`.
//!
//! The interactive prompt and any HTTP front-end are explicitly external
//! collaborators to the query engine (see the crate's module docs); this
//! binary is the minimal optional surface §6 describes, not a product.

use std::io::{self, BufRead, Write};

use clap::Parser;
use query_engine::{EngineConfig, Mode, QueryProcessor};

#[derive(Parser)]
#[command(
    name = "query-engine",
    about = "Ranked retrieval over a precomputed on-disk inverted index"
)]
struct Cli {
    /// Path to the posting-list index file
    index: String,
    /// Path to the lexicon file
    lexicon: String,
    /// Path to the page table file
    page_table: String,
    /// Path to the doc-lengths file
    doc_lengths: String,

    /// BM25 k1 parameter
    #[arg(long, default_value_t = 1.5)]
    k1: f64,
    /// BM25 b parameter
    #[arg(long, default_value_t = 0.75)]
    b: f64,
    /// Default number of results per query
    #[arg(long, default_value_t = 10)]
    top_k: u32,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = EngineConfig {
        k1: cli.k1,
        b: cli.b,
        top_k: cli.top_k,
    };

    let processor = match QueryProcessor::open_with_config(
        &cli.index,
        &cli.lexicon,
        &cli.page_table,
        &cli.doc_lengths,
        config,
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("startup failed: {e}");
            std::process::exit(1);
        }
    };

    let stats = processor.stats();
    println!(
        "Total Documents: {}\nAverage Document Length: {}",
        stats.n, stats.avgdl
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\nEnter your query (or type 'exit' to quit): ");
        io::stdout().flush().ok();
        let Some(Ok(query)) = lines.next() else {
            break;
        };
        if query.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        print!("Choose mode (AND/OR): ");
        io::stdout().flush().ok();
        let Some(Ok(mode_line)) = lines.next() else {
            break;
        };
        let mode = if mode_line.trim().eq_ignore_ascii_case("and") {
            Mode::And
        } else {
            Mode::Or
        };

        let hits = processor.search(&query, mode, config.top_k);
        if hits.is_empty() {
            println!("No documents matched the query.");
            continue;
        }
        for (rank, hit) in hits.iter().enumerate() {
            println!(
                "{}. DocID: {}, DocName: {}, Score: {}",
                rank + 1,
                hit.doc_id,
                hit.doc_name,
                hit.score
            );
        }
    }
}
