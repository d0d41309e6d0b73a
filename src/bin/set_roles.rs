//! Assign role claims to existing platform accounts.
//!
//! The console trusts the `role` custom claim on the provider token; this
//! tool is how that claim gets onto an account in the first place.
//!
//! ```text
//! set_roles engineer@test.com=facility_engineer auditor@test.com=auditor
//! ```

use clap::Parser;

use accelera_console::provider::identity::{IdentityConfig, IdentityToolkitClient};

/// Assign `role` custom claims to provider accounts by email.
#[derive(Parser, Debug)]
#[command(name = "set_roles")]
struct Args {
    /// Assignments, each as EMAIL=ROLE.
    #[arg(required = true, value_name = "EMAIL=ROLE")]
    assignments: Vec<String>,
}

fn parse_assignment(raw: &str) -> Result<(&str, &str), String> {
    match raw.split_once('=') {
        Some((email, role)) if !email.is_empty() && !role.is_empty() => Ok((email, role)),
        _ => Err(format!("expected EMAIL=ROLE, got {raw:?}")),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let admin_token = std::env::var("IDENTITY_ADMIN_TOKEN").expect("IDENTITY_ADMIN_TOKEN required");
    let config = IdentityConfig::from_env().expect("IDENTITY_API_KEY required");
    let client = IdentityToolkitClient::new(config).expect("identity client init failed");

    for raw in &args.assignments {
        let (email, role) = match parse_assignment(raw) {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(2);
            }
        };
        match client.set_role_for_email(&admin_token, email, role).await {
            Ok(()) => println!("Set role {role} for {email}"),
            Err(e) => {
                eprintln!("Failed to set role for {email}: {e}");
                std::process::exit(1);
            }
        }
    }
}
