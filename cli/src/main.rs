mod client;
mod commands;
mod formatters;

use client::DaemonClient;
use std::env;

const DEFAULT_DAEMON_URL: &str = "http://127.0.0.1:4000";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let cmd = args[1].as_str();
    let url = env::var("DEVSVC_URL").unwrap_or_else(|_| DEFAULT_DAEMON_URL.to_string());
    let client = DaemonClient::new(&url);

    // Dispatch to command handlers
    match cmd {
        "list" | "ls" => commands::handle_list(&client)?,
        "status" => commands::handle_status(&client, &args)?,
        "start" => commands::handle_start(&client, &args)?,
        "stop" => commands::handle_stop(&client, &args)?,
        "restart" => commands::handle_restart(&client, &args)?,
        "logs" => commands::handle_logs(&client, &args)?,
        "clear-log" => commands::handle_clear_log(&client, &args)?,
        "tail" => commands::handle_tail(&client, &args)?,
        "health" => commands::handle_health(&client)?,
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("unknown command: {}", cmd);
            print_usage();
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_usage() {
    eprintln!("Dev Service CLI");
    eprintln!();
    eprintln!("Usage: devsvc <command> [args...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list                        List configured services (alias: ls)");
    eprintln!("  status <name>               Show liveness and state of a service");
    eprintln!("  start <name> [--build]      Start a service, building it first with --build");
    eprintln!("  stop <name>                 Stop a service");
    eprintln!("  restart <name> [--build]    Stop then start a service");
    eprintln!("  logs <name> [file]          List log files, or print one");
    eprintln!("  clear-log <name> <file>     Truncate a log file");
    eprintln!("  tail <name> [file]          Follow a log file (newest by default)");
    eprintln!("  health                      Check the daemon is up (exit 0 if healthy)");
    eprintln!();
    eprintln!("Environment Variables:");
    eprintln!("  DEVSVC_URL   Daemon address (default: {})", DEFAULT_DAEMON_URL);
}
