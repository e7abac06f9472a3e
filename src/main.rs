use std::env;
use std::io;
use std::process::ExitCode;

use loyalty_ledger::csv::{read_events, write_summary};
use loyalty_ledger::{FileStorage, Ledger};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

const USAGE: &str = "usage: loyalty-ledger <events.csv> <store-dir>";
const DEFAULT_CUSTOMER: &str = "guest";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let (Some(events_path), Some(store_dir)) = (args.next(), args.next()) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let customer = env::var("LOYALTY_CUSTOMER").unwrap_or_else(|_| DEFAULT_CUSTOMER.to_string());

    if !events_path.ends_with(".csv") {
        warn!(path = %events_path, "input file seems to not be a csv file");
    }

    let storage = match FileStorage::for_customer(&store_dir, &customer) {
        Ok(storage) => storage,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let mut ledger = match Ledger::initialize(storage) {
        Ok(ledger) => ledger,
        Err(e) => {
            error!("failed to load loyalty record: {e}");
            return ExitCode::FAILURE;
        }
    };

    let events = match read_events(events_path) {
        Ok(events) => events,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let (event_sender, event_receiver) = tokio::sync::mpsc::channel(16);

    tokio::task::spawn_blocking(move || {
        for result in events {
            match result {
                Ok(event) => {
                    if event_sender.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    ledger.run(ReceiverStream::new(event_receiver)).await;

    let stdout = io::stdout();
    if let Err(e) = write_summary(
        stdout.lock(),
        ledger.record(),
        ledger.points_to_next_tier(),
        ledger.tier_progress(),
    ) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
