//! Basic callsign lookup example for the QRZ callbook client.
//!
//! This example demonstrates how to:
//! - Log in with credentials from the environment
//! - Look up a callsign
//! - Print every field of the returned mapping
//!
//! Usage:
//! ```
//! QRZ_USERNAME=your_username QRZ_PASSWORD=your_password cargo run --example basic_lookup -- KE2EHU
//! ```
//!
//! Set `QRZ_INSECURE=1` to talk to the service over plain HTTP.

use qrz_callbook::{Protocol, QrzXmlClient, QrzXmlError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    // Get credentials from environment variables
    let username = env::var("QRZ_USERNAME").expect("QRZ_USERNAME environment variable must be set");
    let password = env::var("QRZ_PASSWORD").expect("QRZ_PASSWORD environment variable must be set");
    let protocol = match env::var("QRZ_INSECURE") {
        Ok(flag) if flag == "1" => Protocol::Http,
        _ => Protocol::Https,
    };

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <callsign>", args[0]);
        eprintln!("Example: {} KE2EHU", args[0]);
        std::process::exit(1);
    }
    let callsign = &args[1];

    let client = QrzXmlClient::new()?;

    println!("Logging in to QRZ.com...");
    match client
        .login_with_protocol(&username, &password, protocol)
        .await
    {
        Ok(_) => println!("Login successful!"),
        Err(QrzXmlError::Session { message }) => {
            eprintln!("Login refused: {}", message);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Login error: {}", e);
            std::process::exit(1);
        }
    }

    match client.lookup_callsign(callsign).await {
        Ok(record) => {
            println!("\n=== {} ===", callsign.to_uppercase());
            for (path, value) in record.leaves() {
                println!("{} = {}", path, value);
            }
        }
        Err(QrzXmlError::Session { message }) => {
            eprintln!("Lookup refused: {}", message);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Lookup error: {}", e);
            std::process::exit(1);
        }
    }

    let (count, sub_exp) = client.session_info().await;
    if let Some(count) = count {
        println!("\nLookups today: {}", count);
    }
    if let Some(sub_exp) = sub_exp {
        println!("Subscription expires: {}", sub_exp);
    }

    Ok(())
}
