use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use shared::{AttendanceStatus, Notification, NotificationLevel};
use std::path::PathBuf;
use std::sync::Arc;

use choir_attendance::domain::date_utils::{format_date, today};
use choir_attendance::domain::{Member, Notifier};
use choir_attendance::{AttendanceConfig, AttendanceSession};

#[derive(Parser)]
#[command(name = "choir-attendance")]
#[command(version)]
#[command(about = "Record and export choir attendance, one snapshot per date", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the attendance store (overrides the config file)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the roster with statuses for a date
    Show {
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(short = 'D', long)]
        date: Option<String>,

        /// Only members whose number or name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Set statuses and save, e.g. `mark 007=present 12=od 3=none`
    Mark {
        #[arg(short = 'D', long)]
        date: Option<String>,

        /// MEMBER=STATUS pairs; STATUS is present, od, absent or none
        #[arg(required = true, value_parser = parse_mark)]
        marks: Vec<Mark>,
    },
    /// Rename a member and save
    Rename {
        #[arg(short = 'D', long)]
        date: Option<String>,

        member: String,

        name: String,
    },
    /// Write the attendance report for a date as CSV
    Export {
        #[arg(short = 'D', long)]
        date: Option<String>,

        /// Output directory (defaults to the Documents folder)
        #[arg(short, long)]
        out: Option<String>,
    },
    /// List every date with saved attendance
    Dates,
    /// Show or change the dark mode preference
    Theme {
        #[arg(value_enum, default_value_t = ThemeAction::Show)]
        action: ThemeAction,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ThemeAction {
    Show,
    Toggle,
    Dark,
    Light,
}

#[derive(Clone, Debug)]
struct Mark {
    member: String,
    status: Option<AttendanceStatus>,
}

fn parse_mark(raw: &str) -> Result<Mark, String> {
    let (member, status) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected MEMBER=STATUS, got '{}'", raw))?;

    let status = match status.trim().to_lowercase().as_str() {
        "none" | "clear" | "" => None,
        other => Some(other.parse::<AttendanceStatus>().map_err(|e| e.to_string())?),
    };

    Ok(Mark {
        member: member.trim().to_string(),
        status,
    })
}

/// Accept "7" as well as "007"
fn normalize_member_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<usize>() {
        Ok(ordinal) => Member::generate_id(ordinal),
        Err(_) => trimmed.to_string(),
    }
}

/// Prints notifications to the terminal
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => println!("ℹ️  {}", notification.message),
            NotificationLevel::Success => println!("✅ {}", notification.message),
            NotificationLevel::Error => eprintln!("❌ {}", notification.message),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AttendanceConfig::load_or_default(cli.config.as_deref())?;
    let mut session =
        AttendanceSession::open(config, cli.data_dir.as_deref(), Arc::new(ConsoleNotifier))
            .context("Failed to open attendance store")?;

    match cli.command {
        Commands::Show { date, search } => {
            select(&mut session, date)?;
            show(&session, search.as_deref());
        }
        Commands::Mark { date, marks } => {
            select(&mut session, date)?;
            for mark in &marks {
                let member_id = normalize_member_id(&mark.member);
                match mark.status {
                    Some(status) => session.set_status(&member_id, status)?,
                    None => session.clear_status(&member_id)?,
                }
            }
            save(&mut session)?;
        }
        Commands::Rename { date, member, name } => {
            select(&mut session, date)?;
            session.rename(&normalize_member_id(&member), &name)?;
            save(&mut session)?;
        }
        Commands::Export { date, out } => {
            select(&mut session, date)?;
            let result = session.export(out.as_deref())?;
            println!("{}", result.file_path.display());
        }
        Commands::Dates => {
            for date in session.saved_dates()? {
                println!("{}  {}", date, format_date(&date));
            }
        }
        Commands::Theme { action } => {
            let dark = match action {
                ThemeAction::Show => session.dark_mode()?,
                ThemeAction::Toggle => session.toggle_dark_mode()?,
                ThemeAction::Dark => {
                    session.set_dark_mode(true)?;
                    true
                }
                ThemeAction::Light => {
                    session.set_dark_mode(false)?;
                    false
                }
            };
            println!("{}", if dark { "🌙 dark" } else { "☀️ light" });
        }
    }

    Ok(())
}

fn select(session: &mut AttendanceSession, date: Option<String>) -> Result<()> {
    let date = date.unwrap_or_else(today);
    info!("Selecting date {}", date);
    let report = session.select_date(&date)?;
    if report.record_error.is_some() {
        bail!("Attendance data for {} is unreadable", report.date);
    }
    Ok(())
}

fn save(session: &mut AttendanceSession) -> Result<()> {
    let report = session.save()?;
    if !report.is_complete() {
        bail!("Attendance was not fully saved ({} failed writes)", report.write_errors.len());
    }
    Ok(())
}

fn show(session: &AttendanceSession, search: Option<&str>) {
    let rows = session.search(search.unwrap_or_default());

    println!("{:<6} {:<32} {}", "No.", "Name", "Status");
    for row in &rows {
        let status = row.status.map(|s| s.label()).unwrap_or("-");
        println!("{:<6} {:<32} {}", row.member.id(), row.member.name, status);
    }

    let summary = session.summary();
    println!();
    println!(
        "Total {}  Present {}  OD {}  Absent {}",
        summary.total_members, summary.present, summary.on_duty, summary.absent
    );
}
