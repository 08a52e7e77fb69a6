use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};
use log::debug;

use super::navigation::{Event, Screen};
use super::{AppContext, Session};
use crate::database::models::{LogEntry, LogRecord};
use crate::error::Error;
use crate::record::{FEATURE_COUNT, FEATURE_LABELS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdminAction {
    ViewLogs,
    AddDoctor,
    ListDoctors,
    Logout,
}

impl std::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminAction::ViewLogs => write!(f, "View Logs"),
            AdminAction::AddDoctor => write!(f, "Add Doctor"),
            AdminAction::ListDoctors => write!(f, "List Doctors"),
            AdminAction::Logout => write!(f, "Logout"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DoctorAction {
    Predict,
    History,
    Logout,
}

impl std::fmt::Display for DoctorAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoctorAction::Predict => write!(f, "Predict"),
            DoctorAction::History => write!(f, "My Predictions"),
            DoctorAction::Logout => write!(f, "Logout"),
        }
    }
}

/// Esc and Ctrl-C end the current prompt without being an error.
fn cancellable<T>(result: Result<T, InquireError>) -> Result<Option<T>, Error> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Drive the session until the user leaves the login screen.
pub async fn run(ctx: &AppContext) -> Result<(), Error> {
    let mut screen = Screen::Login;
    loop {
        debug!(
            "Screen: {:?} (user: {:?})",
            screen,
            screen.session().map(|s| s.username.as_str())
        );
        screen = match screen {
            Screen::Login => match login_screen(ctx).await? {
                Some(session) => Screen::Login.on(Event::LoggedIn(session)),
                None => return Ok(()),
            },
            Screen::AdminHome(session) => {
                let event = admin_screen(ctx, &session).await?;
                Screen::AdminHome(session).on(event)
            }
            Screen::DoctorHome(session) => {
                let event = doctor_screen(ctx, &session).await?;
                Screen::DoctorHome(session).on(event)
            }
        };
    }
}

/// `None` means the user wants to quit.
async fn login_screen(ctx: &AppContext) -> Result<Option<Session>, Error> {
    println!("\n== Login ==");
    loop {
        let Some(username) = cancellable(Text::new("Username:").prompt())? else {
            return Ok(None);
        };
        let Some(password) = cancellable(
            Password::new("Password:")
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Masked)
                .prompt(),
        )?
        else {
            return Ok(None);
        };

        match ctx.login(username.trim(), &password).await {
            Ok(session) => return Ok(Some(session)),
            Err(e) => println!("Error: {}", e),
        }
    }
}

async fn admin_screen(ctx: &AppContext, session: &Session) -> Result<Event, Error> {
    println!("\n== Admin Portal ==");
    let actions = vec![
        AdminAction::ViewLogs,
        AdminAction::AddDoctor,
        AdminAction::ListDoctors,
        AdminAction::Logout,
    ];
    loop {
        let action = cancellable(Select::new("Choose an action", actions.clone()).prompt())?
            .unwrap_or(AdminAction::Logout);
        match action {
            AdminAction::ViewLogs => match ctx.view_logs(session).await {
                Ok(logs) => print_logs(&logs),
                Err(e) => println!("Error: {}", e),
            },
            AdminAction::AddDoctor => add_doctor_form(ctx, session).await?,
            AdminAction::ListDoctors => match ctx.list_doctors(session).await {
                Ok(doctors) if doctors.is_empty() => println!("No doctors yet."),
                Ok(doctors) => {
                    for d in doctors {
                        println!("{:>4}  {}", d.id, d.username);
                    }
                }
                Err(e) => println!("Error: {}", e),
            },
            AdminAction::Logout => return Ok(Event::Logout),
        }
    }
}

async fn add_doctor_form(ctx: &AppContext, session: &Session) -> Result<(), Error> {
    let Some(username) = cancellable(Text::new("Doctor username:").prompt())? else {
        return Ok(());
    };
    let Some(password) = cancellable(
        Password::new("Doctor password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt(),
    )?
    else {
        return Ok(());
    };

    match ctx.add_doctor(session, &username, &password).await {
        Ok(user) => println!("Doctor '{}' added successfully", user.username),
        Err(Error::UsernameTaken(name)) => println!("Error: username '{}' already exists", name),
        Err(e) => println!("Error: {}", e),
    }
    Ok(())
}

async fn doctor_screen(ctx: &AppContext, session: &Session) -> Result<Event, Error> {
    println!("\n== Doctor Portal ({}) ==", session.username);
    let actions = vec![
        DoctorAction::Predict,
        DoctorAction::History,
        DoctorAction::Logout,
    ];
    loop {
        let action = cancellable(Select::new("Choose an action", actions.clone()).prompt())?
            .unwrap_or(DoctorAction::Logout);
        match action {
            DoctorAction::Predict => predict_form(ctx, session).await?,
            DoctorAction::History => match ctx.my_history(session).await {
                Ok(entries) => print_entries(&entries),
                Err(e) => println!("Error: {}", e),
            },
            DoctorAction::Logout => return Ok(Event::Logout),
        }
    }
}

async fn predict_form(ctx: &AppContext, session: &Session) -> Result<(), Error> {
    let mut fields = Vec::with_capacity(FEATURE_COUNT);
    for label in FEATURE_LABELS {
        let Some(value) = cancellable(Text::new(&format!("{}:", label)).prompt())? else {
            println!("Prediction cancelled.");
            return Ok(());
        };
        fields.push(value);
    }

    match ctx.submit_prediction(session, &fields).await {
        Ok(entry) => {
            let label = entry
                .label()
                .map_or_else(|| "unknown".to_string(), |l| l.to_string());
            println!(
                "Result\n  Risk: {} ({})\n  Probability: {:.2}",
                entry.risk_prediction, label, entry.risk_probability
            );
        }
        Err(Error::InvalidInput(msg)) => {
            println!("Invalid input. Please check your entries: {}", msg)
        }
        Err(e) => println!("Error: {}", e),
    }
    Ok(())
}

fn format_timestamp(entry: &LogEntry) -> String {
    entry.created_at().map_or_else(
        || entry.timestamp.to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn print_logs(logs: &[LogRecord]) {
    if logs.is_empty() {
        println!("No predictions logged yet.");
        return;
    }
    println!(
        "{:<20} {:<16} {:>6} {:>15} {:>16}",
        "Timestamp", "Doctor", "Age", "Risk Prediction", "Risk Probability"
    );
    for log in logs {
        println!(
            "{:<20} {:<16} {:>6} {:>15} {:>16.2}",
            format_timestamp(&log.entry),
            log.username,
            log.entry.record.age,
            log.entry.risk_prediction,
            log.entry.risk_probability
        );
    }
}

fn print_entries(entries: &[LogEntry]) {
    if entries.is_empty() {
        println!("No predictions yet.");
        return;
    }
    println!(
        "{:<20} {:>6} {:>8} {:>15} {:>16}",
        "Timestamp", "Age", "EF", "Risk Prediction", "Risk Probability"
    );
    for entry in entries {
        println!(
            "{:<20} {:>6} {:>8} {:>15} {:>16.2}",
            format_timestamp(entry),
            entry.record.age,
            entry.record.ejection_fraction,
            entry.risk_prediction,
            entry.risk_probability
        );
    }
}
