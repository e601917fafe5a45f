use std::env::{self, VarError};

/// Non-secret variables that are safe to echo back to the terminal.
const DISPLAY_ENVS: [&str; 10] = [
    "RUST_LOG",
    "SHOWTIME_HOST",
    "SHOWTIME_PORT",
    "SHOWTIME_DATABASE_URL",
    "SHOWTIME_DB_MAX_CONNECTIONS",
    "SHOWTIME_STRIPE_WEBHOOK_TOLERANCE",
    "SHOWTIME_EVENT_BUS_URL",
    "SHOWTIME_IDENTITY_API_URL",
    "SHOWTIME_SESSION_PUBLIC_KEY",
    "SHOWTIME_HTTP_TIMEOUT",
];

/// The server takes no arguments. Passing any prints the help text and the current configuration, and returns `true`
/// so that the caller can exit.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        println!("\n{}\n", include_str!("./cli-help.txt"));
        println!("Current environment values (secrets are never shown):");
        for name in DISPLAY_ENVS {
            println!("  {name:<35} {}", describe_env(name));
        }
    }
    has_cli_args
}

fn describe_env(name: &str) -> String {
    match env::var(name) {
        Ok(s) if name == "SHOWTIME_SESSION_PUBLIC_KEY" => format!("Set ({} bytes)", s.len()),
        Ok(s) => s,
        Err(VarError::NotPresent) => "Not set".into(),
        Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
    }
}
