use crate::client::{ClientError, DaemonClient, LogEvent};
use crate::formatters::{format_liveness, format_opt, format_state, truncate};
use colored::*;
use std::io::Write;
use std::process;
use tabwriter::TabWriter;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Report a failed request and exit non-zero
fn fail(err: ClientError) -> ! {
    eprintln!("{} {}", "[ERROR]".red(), err);
    if let ClientError::Api { status, body } = &err {
        eprintln!("  {}", format!("HTTP {} {}", status, body.kind).dimmed());
        if let Some(log_file) = &body.log_file {
            eprintln!("  Log file: {}", log_file);
        }
    }
    if let Some(log) = err.log() {
        eprintln!();
        eprintln!("--- last log output ---");
        eprint!("{}", log);
        if !log.ends_with('\n') {
            eprintln!();
        }
    }
    process::exit(1);
}

/// `<name> [--build]` arguments of start and restart
fn parse_build_args(args: &[String], command: &str) -> Option<(String, bool)> {
    let mut name = None;
    let mut build = false;
    for arg in &args[2..] {
        match arg.as_str() {
            "--build" | "-b" => build = true,
            other if name.is_none() && !other.starts_with('-') => name = Some(other.to_string()),
            _ => {
                eprintln!("usage: devsvc {} <name> [--build]", command);
                return None;
            }
        }
    }
    if name.is_none() {
        eprintln!("usage: devsvc {} <name> [--build]", command);
    }
    name.map(|n| (n, build))
}

pub fn handle_list(client: &DaemonClient) -> CmdResult {
    let list = client.list().unwrap_or_else(|e| fail(e));

    if list.services.is_empty() {
        println!("No services configured");
        return Ok(());
    }

    let mut tw = TabWriter::new(std::io::stdout()).padding(2);
    writeln!(tw, "NAME\tTYPE\tPORT\tDESCRIPTION")?;
    for s in &list.services {
        writeln!(
            tw,
            "{}\t{}\t{}\t{}",
            s.name,
            format_opt(s.service_type.as_deref()),
            format_opt(s.port),
            truncate(s.description.as_deref().unwrap_or("-"), 60),
        )?;
    }
    tw.flush()?;
    Ok(())
}

pub fn handle_status(client: &DaemonClient, args: &[String]) -> CmdResult {
    if args.len() != 3 {
        eprintln!("usage: devsvc status <name>");
        return Ok(());
    }

    let status = client.status(&args[2]).unwrap_or_else(|e| fail(e));

    println!("Service: {}", status.service.bold());
    println!("  State:    {}", format_state(&status.state));
    println!("  Liveness: {}", format_liveness(&status.liveness));
    println!("  Running:  {}", status.running);
    if !status.checkable {
        println!("  (no port or health command, liveness comes from the launched process)");
    }
    println!("  Type:     {}", format_opt(status.service_type.as_deref()));
    println!("  Port:     {}", format_opt(status.port));
    println!("  Path:     {}", format_opt(status.path.as_deref()));
    println!("  PID:      {}", format_opt(status.pid));
    if let Some(code) = status.exit_code {
        println!("  Exit:     {}", code);
    }
    if let Some(log_file) = &status.log_file {
        println!("  Log file: {}", log_file);
    }
    Ok(())
}

pub fn handle_start(client: &DaemonClient, args: &[String]) -> CmdResult {
    let Some((name, build)) = parse_build_args(args, "start") else {
        return Ok(());
    };

    if build {
        println!("Building and starting {}...", name);
    }
    let started = client.start(&name, build).unwrap_or_else(|e| fail(e));

    if started.coalesced {
        println!("[OK] Service {} was already being started", started.service);
    } else {
        println!("[OK] Service {} started", started.service);
    }
    println!("  PID: {}", started.pid);
    println!("  Log file: {}", started.log_file);
    Ok(())
}

pub fn handle_stop(client: &DaemonClient, args: &[String]) -> CmdResult {
    if args.len() != 3 {
        eprintln!("usage: devsvc stop <name>");
        return Ok(());
    }

    let stopped = client.stop(&args[2]).unwrap_or_else(|e| fail(e));

    println!("[OK] Service {} stopped", stopped.service);
    if stopped.ran_stop_command {
        println!("  Ran stop command");
    }
    if let Some(port) = stopped.freed_port {
        println!("  Freed port: {}", port);
    }
    if let Some(pid) = stopped.previous_pid {
        println!("  Previous PID: {}", pid);
    }
    Ok(())
}

pub fn handle_restart(client: &DaemonClient, args: &[String]) -> CmdResult {
    let Some((name, build)) = parse_build_args(args, "restart") else {
        return Ok(());
    };

    let restarted = client.restart(&name, build).unwrap_or_else(|e| fail(e));

    println!("[OK] Service {} restarted", restarted.started.service);
    println!(
        "  PID: {} -> {}",
        format_opt(restarted.stopped.previous_pid),
        restarted.started.pid
    );
    println!("  Log file: {}", restarted.started.log_file);
    Ok(())
}

pub fn handle_logs(client: &DaemonClient, args: &[String]) -> CmdResult {
    match args.len() {
        3 => {
            let logs = client.log_files(&args[2]).unwrap_or_else(|e| fail(e));
            if logs.files.is_empty() {
                println!("No log files for {}", args[2]);
            }
            for file in &logs.files {
                println!("{}", file);
            }
        }
        4 => {
            let log = client.read_log(&args[2], &args[3]).unwrap_or_else(|e| fail(e));
            print!("{}", log.content);
        }
        _ => eprintln!("usage: devsvc logs <name> [file]"),
    }
    Ok(())
}

pub fn handle_clear_log(client: &DaemonClient, args: &[String]) -> CmdResult {
    if args.len() != 4 {
        eprintln!("usage: devsvc clear-log <name> <file>");
        return Ok(());
    }

    client
        .clear_log(&args[2], &args[3])
        .unwrap_or_else(|e| fail(e));
    println!("[OK] Cleared {}", args[3]);
    Ok(())
}

pub fn handle_tail(client: &DaemonClient, args: &[String]) -> CmdResult {
    let file = match args.len() {
        3 => {
            let logs = client.log_files(&args[2]).unwrap_or_else(|e| fail(e));
            match logs.files.into_iter().next() {
                Some(newest) => newest,
                None => {
                    eprintln!("No log files for {}", args[2]);
                    process::exit(1);
                }
            }
        }
        4 => args[3].clone(),
        _ => {
            eprintln!("usage: devsvc tail <name> [file]");
            return Ok(());
        }
    };

    eprintln!("{}", format!("==> {} <==", file).dimmed());
    let mut stdout = std::io::stdout();
    client
        .follow_log(&args[2], &file, |event| {
            match event {
                LogEvent::Initial { content } | LogEvent::Append { content } => {
                    print!("{}", content);
                }
                LogEvent::Replace { content } => {
                    eprintln!("{}", "--- log file truncated ---".yellow());
                    print!("{}", content);
                }
                LogEvent::Heartbeat => {}
            }
            let _ = stdout.flush();
        })
        .unwrap_or_else(|e| fail(e));
    Ok(())
}

pub fn handle_health(client: &DaemonClient) -> CmdResult {
    match client.health() {
        Ok(health) => {
            println!(
                "[OK] Daemon at {} is {} ({} log streams open)",
                client.base_url(),
                health.status,
                health.active_log_streams
            );
            Ok(())
        }
        Err(e) => fail(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_build_args() {
        assert_eq!(
            parse_build_args(&args(&["devsvc", "start", "api"]), "start"),
            Some(("api".to_string(), false))
        );
        assert_eq!(
            parse_build_args(&args(&["devsvc", "start", "--build", "api"]), "start"),
            Some(("api".to_string(), true))
        );
        assert_eq!(
            parse_build_args(&args(&["devsvc", "restart", "api", "-b"]), "restart"),
            Some(("api".to_string(), true))
        );
        assert_eq!(parse_build_args(&args(&["devsvc", "start"]), "start"), None);
        assert_eq!(
            parse_build_args(&args(&["devsvc", "start", "a", "b"]), "start"),
            None
        );
        assert_eq!(
            parse_build_args(&args(&["devsvc", "start", "api", "--force"]), "start"),
            None
        );
    }
}
