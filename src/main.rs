use std::env;

use anyhow::{Context, Result};
use sro_track::{
    Credentials, ResultKind, SoapClient, SroConfig, TrackingKind, TrackingQuery, TrackingService,
    with_check_digit,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sro_track=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <object_codes> [kind] [result]", args[0]);
        eprintln!("  object_codes: comma-separated (e.g., SS12345678BR,PN98765432BR)");
        eprintln!("  kind: list, range (default: list)");
        eprintln!("  result: last, all (default: all)");
        eprintln!("  credentials are read from SRO_USER and SRO_PASSWORD");
        std::process::exit(1);
    }

    let object_codes = args[1]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(with_check_digit)
        .collect::<Result<Vec<_>, _>>()?;

    if object_codes.is_empty() {
        eprintln!("Error: No object codes provided");
        std::process::exit(1);
    }

    let tracking_kind: TrackingKind = args.get(2).map(|s| s.as_str()).unwrap_or("list").parse()?;
    let result_kind: ResultKind = args.get(3).map(|s| s.as_str()).unwrap_or("all").parse()?;

    let credentials = Credentials::new(
        env::var("SRO_USER").context("SRO_USER is not set")?,
        env::var("SRO_PASSWORD").context("SRO_PASSWORD is not set")?,
    );

    let client = SoapClient::with_config(SroConfig::from_env())?;
    let service = TrackingService::new(client);

    let query = TrackingQuery::list(credentials, object_codes)
        .with_tracking_kind(tracking_kind)
        .with_result_kind(result_kind);

    println!("Tracking {} object(s)...", query.object_codes.len());
    let objects = service
        .track(&query)
        .await
        .into_result()
        .context("Tracking failed")?;

    for object in &objects {
        println!("\nObject: {}", object.object_code());
        if object.events().is_empty() {
            println!("  No events");
            continue;
        }
        for event in object.events() {
            println!(
                "  {} [{}/{}] {}",
                event.timestamp.format("%d/%m/%Y %H:%M"),
                event.event_type,
                event.status,
                event.description
            );
            println!("    at {} - {}/{}", event.location, event.city, event.state);
            if let Some(details) = &event.details {
                println!("    {}", details);
            }
        }
    }

    Ok(())
}
