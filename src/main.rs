// src/main.rs
// DOCUMENTATION: Command line entry point
// PURPOSE: Initialize config and logging, then run one API command

use anyhow::{bail, Context, Result};
use bapful_client::models::ReviewVote;
use bapful_client::{ApiClient, ClientError, Config, Coordinates, FileStore};
use dotenv::dotenv;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;

const USAGE: &str = "usage: bapful <command> [args]

commands:
  health
  login <email> <password>
  register <name> <email> <password>
  logout
  whoami
  nearby <lat> <lng> [radius_m]
  search <query> <lat> <lng>
  place <location_id>
  reviews <location_id> [limit] [offset]
  review <location_id> <rating 1-5> [comment]
  vote <location_id> <review_id> <up|down>";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        log::debug!("Command failed: {:?}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.as_str()
        } else {
            "info,reqwest=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        bail!("Configuration error: {}", e);
    }

    log::debug!("Environment: {}", config.environment);
    log::debug!("API base URL: {}", config.api_base_url);

    // 4. Build the client over the on-disk session
    let store = Arc::new(FileStore::new(config.session_file.clone()));
    let client = ApiClient::new(&config, store).context("cannot create API client")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    match command.as_str() {
        "health" => print_json(&client.health_check().await?),

        "login" => {
            let session = client
                .login(arg(&args, 1, "email")?, arg(&args, 2, "password")?)
                .await
                .map_err(describe)?;
            println!("Logged in as {} <{}>", session.user.name, session.user.email);
            Ok(())
        }

        "register" => {
            let session = client
                .register(
                    arg(&args, 1, "name")?,
                    arg(&args, 2, "email")?,
                    arg(&args, 3, "password")?,
                )
                .await
                .map_err(describe)?;
            println!("Registered {} <{}>", session.user.name, session.user.email);
            Ok(())
        }

        "logout" => {
            client.logout().await;
            println!("Logged out");
            Ok(())
        }

        "whoami" => {
            match client.current_user().await {
                Some(user) => print_json(&user),
                None => {
                    println!("Not logged in");
                    Ok(())
                }
            }
        }

        "nearby" => {
            let origin = coordinates(&args, 1)?;
            let radius = optional(&args, 3, "radius_m")?;
            print_json(&client.nearby_locations(origin, radius).await.map_err(describe)?)
        }

        "search" => {
            let query = arg(&args, 1, "query")?;
            let origin = coordinates(&args, 2)?;
            print_json(&client.search_locations(query, origin).await.map_err(describe)?)
        }

        "place" => {
            let id = arg(&args, 1, "location_id")?;
            print_json(&client.location_with_reviews(id, 10).await.map_err(describe)?)
        }

        "reviews" => {
            let id = arg(&args, 1, "location_id")?;
            let limit = optional(&args, 2, "limit")?.unwrap_or(10);
            let offset = optional(&args, 3, "offset")?.unwrap_or(0);
            print_json(
                &client
                    .location_reviews(id, limit, offset)
                    .await
                    .map_err(describe)?,
            )
        }

        "review" => {
            let id = arg(&args, 1, "location_id")?;
            let rating: u8 = parse(&args, 2, "rating")?;
            let comment = args.get(3).map(String::as_str);
            print_json(
                &client
                    .create_review(id, rating, comment)
                    .await
                    .map_err(describe)?,
            )
        }

        "vote" => {
            let location_id = arg(&args, 1, "location_id")?;
            let review_id = arg(&args, 2, "review_id")?;
            let vote = ReviewVote::from_str(arg(&args, 3, "vote")?).map_err(anyhow::Error::msg)?;
            let votes = client
                .rate_review(location_id, review_id, vote)
                .await
                .map_err(describe)?;
            println!("{}: +{} / -{}", votes.review_id, votes.upvotes, votes.downvotes);
            Ok(())
        }

        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }
}

/// Friendlier wording for the failures a user can act on
fn describe(err: ClientError) -> anyhow::Error {
    if matches!(err, ClientError::Conflict(_)) {
        anyhow::anyhow!("{} (try logging in instead)", err)
    } else if err.is_unauthorized() {
        anyhow::anyhow!("{} (session cleared, log in again)", err)
    } else {
        err.into()
    }
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .with_context(|| format!("missing <{}>\n\n{}", name, USAGE))
}

fn parse<T>(args: &[String], index: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = arg(args, index, name)?;
    raw.parse()
        .map_err(|e| anyhow::anyhow!("invalid <{}> '{}': {}", name, raw, e))
}

fn optional<T>(args: &[String], index: usize, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if args.get(index).is_none() {
        return Ok(None);
    }
    parse(args, index, name).map(Some)
}

fn coordinates(args: &[String], index: usize) -> Result<Coordinates> {
    Ok(Coordinates::new(
        parse(args, index, "lat")?,
        parse(args, index + 1, "lng")?,
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
