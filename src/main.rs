use anyhow::Context;
use chrono::Local;
use clap::Parser;
use fair_signup::adapters::assets::HttpAssetStore;
use fair_signup::adapters::memory::PlaceholderQr;
use fair_signup::adapters::notify::HttpNotifier;
use fair_signup::adapters::sheet::HttpSheetStore;
use fair_signup::config::cli::Command;
use fair_signup::core::wizard::PageData;
use fair_signup::utils::{logger, validation::Validate};
use fair_signup::{
    BookingController, BookingServices, CheckInFlow, CheckInState, Cli, EventConfig, SignupError,
    SlotKey, SubmissionInput, WizardPage, WizardState,
};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init_cli_logger(cli.verbose);

    let config = EventConfig::from_path(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    match cli.command {
        Command::Register { input } => {
            let input = SubmissionInput::from_path(&input)?;
            run_register(&config, input).await?;
        }
        Command::Checkin { date, id, healthy } => {
            run_checkin(&config, &date, &id, healthy).await?;
        }
        Command::CheckConfig => {
            print_summary(&config);
        }
    }

    Ok(())
}

/// Drives the full wizard the way the on-site device would: info page,
/// one booking page per selected date, summary, then the submission.
async fn run_register(config: &EventConfig, input: SubmissionInput) -> anyhow::Result<()> {
    input.validate_against(config)?;

    let wizard = WizardState::new(vec![
        WizardPage::new("info", &["name", "phone", "contact_channel", "dates"]),
        WizardPage::new("summary", &[]),
    ]);
    let mut controller = BookingController::new(wizard);

    let info = PageData::from([
        ("name".to_string(), json!(input.attendee.name)),
        ("phone".to_string(), json!(input.attendee.phone)),
        (
            "contact_channel".to_string(),
            json!(input.attendee.contact_channel),
        ),
        ("email".to_string(), json!(input.email)),
        ("dates".to_string(), json!(input.dates)),
    ]);
    controller.wizard_mut().next(info)?;
    controller.wizard_mut().insert_pages(
        0,
        input
            .dates
            .iter()
            .map(|date| WizardPage::new(date.clone(), &[]))
            .collect(),
    );

    for companion in input.companions.clone() {
        controller.add_companion(companion);
    }
    tracing::info!("party of {}", controller.party_size());

    for booking in &input.bookings {
        let slot = SlotKey::new(&booking.date, &booking.timeslot, &booking.workshop);
        controller.select_slot(&slot)?;
        for _ in 1..booking.headcount {
            controller.add_headcount(&slot);
        }
        let seated = controller.ledger().headcount(&slot);
        if seated < booking.headcount {
            tracing::warn!(
                "requested {} seats for {} at {} {}, capacity allowed {}",
                booking.headcount,
                slot.workshop,
                slot.date,
                slot.timeslot,
                seated
            );
        }
    }

    // Walk the per-date pages and the summary; their data was bound by the
    // slot selections above.
    for date in &input.dates {
        let page_data = controller
            .wizard()
            .page_data(date)
            .cloned()
            .unwrap_or_default();
        controller.wizard_mut().next(page_data)?;
    }

    let store = HttpSheetStore::from_config(config);
    let notifier = HttpNotifier::new(config.services.notify_api.clone());
    let assets = HttpAssetStore::new(config.services.asset_api.clone());
    let qr = PlaceholderQr;
    let services = BookingServices {
        store: &store,
        notifier: &notifier,
        assets: &assets,
        qr: &qr,
        badge_prefix: &config.services.badge_prefix,
    };

    let outcome = controller
        .submit(
            &services,
            &input.attendee,
            &input.dates,
            input.email.as_deref(),
        )
        .await?;

    if outcome.persisted.is_empty() {
        eprintln!("❌ registration failed for every selected date");
        for (date, message) in &outcome.failed {
            eprintln!("   {}: {}", date, message);
        }
        std::process::exit(1);
    }

    println!("✅ registered, id: {}", outcome.record_id);
    for date in &outcome.persisted {
        println!("   📋 {}", date);
    }
    for (date, message) in &outcome.failed {
        println!("   ⚠️ {} failed: {}", date, message);
    }
    if let Some(url) = &outcome.badge_url {
        println!("   🎫 badge: {}", url);
    }
    if outcome.notified {
        println!("   📧 confirmation sent");
    }
    Ok(())
}

async fn run_checkin(
    config: &EventConfig,
    date: &str,
    id: &str,
    healthy: bool,
) -> anyhow::Result<()> {
    if config.day(date).is_none() {
        anyhow::bail!("unknown event day: {date}");
    }

    let store = HttpSheetStore::from_config(config);
    let mut flow = CheckInFlow::new(&store);
    let state = flow.lookup(date, id).await?.clone();
    match state {
        CheckInState::NotFound => {
            eprintln!("❌ 找不到登記資料");
            return Err(SignupError::LookupNotFound { id: id.to_string() }.into());
        }
        CheckInState::Ready(record) => {
            tracing::info!(
                "checking in {}",
                record
                    .get_str(fair_signup::domain::model::columns::NAME)
                    .unwrap_or("<unnamed>")
            );
        }
        _ => {}
    }
    flow.submit_declaration(date, healthy, Local::now()).await?;
    println!("✅ 多謝參與");
    Ok(())
}

fn print_summary(config: &EventConfig) {
    println!("✅ {} — configuration OK", config.event.name);
    for day in &config.days {
        println!("   📅 {} ({}): {}", day.key, day.label, day.timeslots.join(", "));
    }
    println!("   🛠 workshops: {}", config.workshops.join(", "));
}
