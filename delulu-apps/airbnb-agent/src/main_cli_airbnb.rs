//!  Delulu Airbnb Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//!
//! # Examples
//!
//! ## Basic search
//!
//! ```bash
//! delulu-airbnb search -L "Paris" -i 2026-03-01 -o 2026-03-05 -a 2
//! ```
//!
//! ## Budget search, next page
//!
//! ```bash
//! delulu-airbnb search -L "Lisbon" --max-price 120 --cursor eyJzZWN0aW9uX29mZnNldCI6MX0=
//! ```
//!
//! ## Listing details
//!
//! ```bash
//! delulu-airbnb listing 12345678 -i 2026-03-01 -o 2026-03-05
//! ```
//!
//! ## Dry run (show URL only)
//!
//! ```bash
//! delulu-airbnb search -L "Tokyo" --dry-run
//! ```
//!
//! # Output
//!
//! A terminal-width summary by default, or the raw tool JSON with `--json`.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use delulu_airbnb_agent::{
    AirbnbClient, DEFAULT_BASE_URL, ListingQuery, ScraperConfig, SearchQuery, ToolOutcome,
};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "delulu-airbnb")]
#[command(author, version, about = "Search Airbnb stays and listing details")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Skip robots.txt checks
    #[arg(long, global = true)]
    ignore_robots_txt: bool,

    /// Print the raw JSON result
    #[arg(long, global = true)]
    json: bool,

    /// Show the URL without making a request
    #[arg(long, global = true)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Site to query
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Args, Debug)]
struct Guests {
    #[arg(short = 'i', long, help = "Check-in date (YYYY-MM-DD)")]
    checkin: Option<String>,
    #[arg(short = 'o', long, help = "Check-out date (YYYY-MM-DD)")]
    checkout: Option<String>,
    #[arg(short = 'a', long, default_value = "1")]
    adults: u32,
    #[arg(short = 'c', long, default_value = "0")]
    children: u32,
    #[arg(long, default_value = "0")]
    infants: u32,
    #[arg(long, default_value = "0")]
    pets: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search stays in a location
    Search {
        #[arg(short = 'L', long)]
        location: String,
        #[arg(long, help = "Google Maps place ID")]
        place_id: Option<String>,
        #[command(flatten)]
        guests: Guests,
        #[arg(long, help = "Minimum price")]
        min_price: Option<f64>,
        #[arg(short = 'p', long, help = "Maximum price")]
        max_price: Option<f64>,
        #[arg(long, help = "Pagination cursor from a previous search")]
        cursor: Option<String>,
        #[arg(short = 'n', long, default_value = "18")]
        limit: usize,
    },
    /// Show the details of one listing
    Listing {
        /// Listing ID
        id: String,
        #[command(flatten)]
        guests: Guests,
    },
}

/// Configure logging based on verbosity level
fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Get terminal width for responsive output
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(100)
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = s.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .and_then(Value::as_str)
}

fn print_search_results(body: &Value, limit: usize) {
    let width = get_terminal_width().max(40);
    let results = body["searchResults"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    if results.is_empty() {
        println!("No stays found.");
        return;
    }
    println!("Found {} stay(s)\n", results.len());
    for (i, stay) in results.iter().take(limit).enumerate() {
        let name = str_at(stay, &["demandStayListing", "description", "name"])
            .or_else(|| str_at(stay, &["structuredContent", "primaryLine", "body"]))
            .unwrap_or("(unnamed)");
        println!("{}", truncate(&format!("{}. {}", i + 1, name), width));
        if let Some(price) = str_at(stay, &["structuredDisplayPrice", "primaryLine", "accessibilityLabel"]) {
            println!("   {}", truncate(price, width - 3));
        }
        if let Some(rating) = str_at(stay, &["avgRatingA11yLabel"]) {
            println!("   {}", truncate(rating, width - 3));
        }
        if let Some(url) = str_at(stay, &["url"]) {
            println!("   {}", url);
        }
        println!();
    }
    if let Some(cursor) = str_at(body, &["paginationInfo", "nextPageCursor"]) {
        println!("Next page: --cursor {}", cursor);
    }
}

fn print_listing_details(body: &Value) {
    let width = get_terminal_width().max(40);
    let details = body["details"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    if details.is_empty() {
        println!("No details found.");
        return;
    }
    for section in details {
        let id = str_at(section, &["id"]).unwrap_or("?");
        println!("[{}]", id);
        if let Value::Object(fields) = section {
            for (key, value) in fields.iter().filter(|(key, _)| key.as_str() != "id") {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                println!("   {}", truncate(&format!("{}: {}", key, rendered), width - 3));
            }
        }
        println!();
    }
}

fn finish(outcome: ToolOutcome, json: bool, print: impl FnOnce(&Value)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome.body())?);
    } else if !outcome.is_error() {
        print(outcome.body());
    }
    if outcome.is_error() {
        let message = str_at(outcome.body(), &["error"]).unwrap_or("unknown error");
        eprintln!("Request failed: {}", message);
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = ScraperConfig::default()
        .with_base_url(cli.base_url)
        .with_ignore_robots_txt(cli.ignore_robots_txt);

    match cli.command {
        Command::Search {
            location,
            place_id,
            guests,
            min_price,
            max_price,
            cursor,
            limit,
        } => {
            let query = SearchQuery {
                location,
                place_id,
                checkin: guests.checkin,
                checkout: guests.checkout,
                adults: guests.adults,
                children: guests.children,
                infants: guests.infants,
                pets: guests.pets,
                min_price,
                max_price,
                cursor,
                ignore_robots_text: false,
            };
            query.validate()?;
            let search_url = query.get_search_url(&config.base_url);
            if cli.dry_run {
                println!("{}", search_url);
                return Ok(());
            }
            if !cli.json {
                println!("\n🏠 Airbnb Search: {}\n", search_url);
            }
            let client = AirbnbClient::new(config)?;
            let outcome = client.search(&query).await;
            finish(outcome, cli.json, |body| print_search_results(body, limit))
        }
        Command::Listing { id, guests } => {
            let query = ListingQuery {
                id,
                checkin: guests.checkin,
                checkout: guests.checkout,
                adults: guests.adults,
                children: guests.children,
                infants: guests.infants,
                pets: guests.pets,
                ignore_robots_text: false,
            };
            query.validate()?;
            let listing_url = query.get_listing_url(&config.base_url);
            if cli.dry_run {
                println!("{}", listing_url);
                return Ok(());
            }
            if !cli.json {
                println!("\n🏠 Airbnb Listing: {}\n", listing_url);
            }
            let client = AirbnbClient::new(config)?;
            let outcome = client.listing_details(&query).await;
            finish(outcome, cli.json, print_listing_details)
        }
    }
}
