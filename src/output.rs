//! Operator-facing console messages (outside the tracing pipeline).
//! Colors are enabled only when the relevant stream is a TTY.

use owo_colors::OwoColorize;

fn stdout_is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_is_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

pub fn print_info(msg: &str) {
    if stdout_is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {msg}");
    }
}

pub fn print_warn(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {msg}");
    }
}

pub fn print_error(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {msg}");
    }
}

pub fn print_success(msg: &str) {
    if stdout_is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {msg}");
    }
}
