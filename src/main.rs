use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use sportlink_onboarding::availability::{AvailabilityChecker, NicknameStatus};
use sportlink_onboarding::config::Config;
use sportlink_onboarding::fields::{Field, PrivacyLevel, SportType};
use sportlink_onboarding::identity::IdentityDefaults;
use sportlink_onboarding::wizard::{
    NavigationResult, SubmissionCoordinator, SubmissionOutcome, WizardFlow, WizardStep,
};
use sportlink_onboarding::error::AppResult;
use sportlink_onboarding::ProfileApiClient;

/// Initialize tracing with file rotation
///
/// Logs are written to:
/// - macOS: ~/Library/Application Support/SportLink/logs/
/// - Windows: %APPDATA%/SportLink/logs/
/// - Linux: ~/.config/SportLink/logs/
///
/// Log output:
/// - Debug builds: Console + File
/// - Release builds: File only
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("SportLink").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "sportlink-onboarding.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

fn main() -> AppResult<()> {
    initialize_tracing();
    tracing::info!(
        "Starting SportLink onboarding v{}",
        env!("CARGO_PKG_VERSION")
    );

    println!("===========================================");
    println!("  SportLink - Profile Onboarding");
    println!("===========================================\n");

    let config = match Config::load() {
        Ok(config) => {
            println!("✓ Configuration loaded");
            println!("  Profile service: {}", config.api_base_url);
            println!("  Debounce window: {}ms\n", config.debounce_ms);
            config
        }
        Err(e) => {
            eprintln!("✗ Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    // Token acquisition is the sign-in layer's job; pick it up if present.
    let auth_token = std::env::var("SPORTLINK_TOKEN").unwrap_or_default();
    let identity = IdentityDefaults {
        email: std::env::var("SPORTLINK_EMAIL").unwrap_or_default(),
        display_name: std::env::var("SPORTLINK_NAME").ok(),
    };

    let client = Arc::new(ProfileApiClient::new(
        config.api_base_url.clone(),
        Duration::from_millis(config.request_timeout_ms),
    ));
    let checker = AvailabilityChecker::new(
        client.clone(),
        Duration::from_millis(config.debounce_ms),
    );
    let mut flow = WizardFlow::with_identity(checker, &identity);
    let coordinator = SubmissionCoordinator::new(client);

    let today = Local::now().date_naive();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let step = flow.current_step();
        println!(
            "\n--- Step {}/{}: {} ---",
            step.number(),
            WizardStep::total_steps(),
            step.title()
        );
        println!("{}", step.description());

        for field in step.fields() {
            if !prompt_field(&mut flow, *field, today, &mut lines) {
                println!("\nInput closed; leaving the wizard.");
                return Ok(());
            }
        }

        if flow.at_final_step() {
            match coordinator.submit(&mut flow, &auth_token, today) {
                SubmissionOutcome::Created(record) => {
                    println!("\n✓ Profile created: @{} (id {})", record.nickname, record.id);
                    break;
                }
                SubmissionOutcome::AlreadyHasProfile => {
                    println!("\nYou already have a profile. Nothing to do here.");
                    break;
                }
                SubmissionOutcome::FieldRejections { redirect } => {
                    print_errors(&flow);
                    if let Some(target) = redirect {
                        println!("Returning to step '{}'...", target.title());
                        flow.go_to(target);
                    }
                }
                SubmissionOutcome::BlockedByValidation => print_errors(&flow),
                SubmissionOutcome::AlreadyInFlight => {
                    println!("Submission already in progress...");
                }
                SubmissionOutcome::Failed { message } => println!("\n✗ {}", message),
            }
        } else {
            match flow.next(today) {
                NavigationResult::Moved(_) => {}
                NavigationResult::Blocked { reason } => {
                    println!("\n✗ {}", reason);
                    print_errors(&flow);
                }
                NavigationResult::AtFinalStep => {}
            }
        }
    }

    Ok(())
}

/// Prompt for one field. Returns false when the input stream has ended.
fn prompt_field(
    flow: &mut WizardFlow,
    field: Field,
    today: NaiveDate,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> bool {
    let current = describe_current(flow, field);
    print!("{} [{}]: ", field.label(), current);
    let _ = io::stdout().flush();

    let input = match lines.next() {
        Some(Ok(line)) => line,
        _ => return false,
    };
    let input = input.trim();
    if input.is_empty() {
        // Keep the current value
        return true;
    }

    match field {
        Field::DateOfBirth => match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            Ok(date) => flow.update_date(field, Some(date)),
            Err(_) => println!("  Enter the date as YYYY-MM-DD"),
        },
        Field::SportTypes => {
            let mut sports = Vec::new();
            for name in input.split(',') {
                match SportType::from_name(name) {
                    Some(sport) => sports.push(sport),
                    None => println!("  Unknown sport: {}", name.trim()),
                }
            }
            flow.update_sports(sports);
        }
        Field::ProfileVisibility | Field::ActivityVisibility => {
            match PrivacyLevel::from_name(input) {
                Some(level) => flow.update_privacy(field, level),
                None => println!("  Use one of: public, followers, private"),
            }
        }
        Field::Nickname => {
            flow.update_text(field, input);
            wait_for_nickname_check(flow);
        }
        _ => flow.update_text(field, input),
    }

    flow.validate_field(field, today);
    if let Some(message) = flow.state().errors().get(field) {
        println!("  ✗ {}", message);
    }
    true
}

/// Block until the availability check leaves `Checking`. A hung service
/// keeps the status at `Checking`; cap the wait so the terminal stays
/// responsive and let the step gate re-block if needed.
fn wait_for_nickname_check(flow: &mut WizardFlow) {
    let mut waited = Duration::ZERO;
    while flow.nickname_status() == NicknameStatus::Checking && waited < Duration::from_secs(15) {
        thread::sleep(Duration::from_millis(100));
        waited += Duration::from_millis(100);
    }
    flow.poll();

    match flow.nickname_status() {
        NicknameStatus::Available => println!("  ✓ Nickname is available"),
        NicknameStatus::Taken => println!("  ✗ This nickname is already taken"),
        NicknameStatus::Errored => {
            println!("  ! Could not verify availability; it will be checked at submission")
        }
        NicknameStatus::Checking => println!("  ... still checking"),
        NicknameStatus::Idle => {}
    }
}

fn print_errors(flow: &WizardFlow) {
    for (field, message) in flow.state().errors().iter() {
        println!("  • {}: {}", field.label(), message);
    }
}

fn describe_current(flow: &WizardFlow, field: Field) -> String {
    let form = flow.state().form();
    match field {
        Field::DateOfBirth => form
            .date(field)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Field::SportTypes => form
            .sports()
            .iter()
            .map(|s| s.display_name())
            .collect::<Vec<_>>()
            .join(", "),
        Field::ProfileVisibility | Field::ActivityVisibility => {
            form.privacy(field).display_name().to_string()
        }
        _ => form.text(field).to_string(),
    }
}
