use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn done(spinner: &ProgressBar, label: &str, elapsed: Duration) {
    spinner.finish_with_message(format!(
        "{} {} {}",
        style("✓").green().bold(),
        label,
        style(format!("[{}]", format_duration(elapsed))).dim()
    ));
}

pub fn failed(spinner: &ProgressBar, label: &str) {
    spinner.finish_with_message(format!("{} {}", style("✗").red().bold(), label));
}

pub fn rule() {
    eprintln!("{}", style("─".repeat(60)).dim());
}
