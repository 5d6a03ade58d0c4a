//! Fetch the live catalog, assemble the genre feed and print each section.
//! Usage:
//!   cargo run --bin feed_dump
//!   cargo run --bin feed_dump -- search <query>
//!   cargo run --bin feed_dump -- show <id>
//! Reads TVMAZE_BASE_URL, FEED_QUERY, FEED_PAGE and EXCLUDED_SHOW_IDS (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde_json::json;
use showreel::config::Config;
use showreel::feed::FeedPipeline;
use showreel::tvmaze::{ShowSource, TvMazeClient};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let config = Config::from_env()?;
    let client = Arc::new(TvMazeClient::from_config(&config)?);

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("search") => {
            let query = args[1..].join(" ");
            let results = client.search(&query).await?;
            for show in results {
                println!("{:>7}  {}  [{}]", show.id, show.name, show.genres.join(", "));
            }
        }
        Some("show") => {
            let id: i64 = args
                .get(1)
                .context("usage: feed_dump show <id>")?
                .parse()
                .context("show id must be an integer")?;
            match client.fetch_show(id).await? {
                Some(details) => println!("{}", serde_json::to_string_pretty(&json!(details))?),
                None => println!("No show with id {}", id),
            }
        }
        _ => {
            let pipeline = FeedPipeline::new(client, config.excluded_ids.clone());
            let sections = pipeline.run().await?;
            for section in sections {
                println!("== {} ({})", section.genre_label, section.members.len());
                for show in &section.members {
                    println!("   {:>7}  {}", show.id, show.name);
                }
            }
        }
    }
    Ok(())
}
