use chrono::Local;
use earthmover_core::models::{DashboardSummary, EarningsSummary};
use earthmover_core::poller::PollerConfig;
use earthmover_core::{BookingStatus, Poller, SessionHandle};

use crate::commands::common::CliContext;
use crate::error::CliError;

fn stamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Follow one booking at the fast interval until it reaches a final status.
pub async fn run_booking_watch(context: &CliContext, booking_id: i64) -> Result<(), CliError> {
    let session = context.restore_session()?;
    let operator = session.is_operator();
    let poller = Poller::new(
        context.api.clone(),
        SessionHandle::with_session(session),
        PollerConfig::default(),
    );
    let mut feed = poller.watch_booking(booking_id);
    // The list shares the watch's fetch and shows the passes where the
    // booking is absent, which the watch feed never reports.
    let mut own_list = if operator {
        poller.subscribe_operator_bookings()
    } else {
        poller.subscribe_user_bookings()
    };
    poller.start_fast_polling();
    println!("Watching booking #{booking_id}; press Ctrl-C to stop.");

    let mut last: Option<BookingStatus> = None;
    let mut presence = WatchPresence::default();
    loop {
        tokio::select! {
            update = feed.recv() => {
                let Some(booking) = update else { break };
                if last != Some(booking.status) {
                    println!("[{}] booking #{} is now {}", stamp(), booking.id, booking.status);
                    last = Some(booking.status);
                }
                if booking.status.is_terminal() {
                    break;
                }
            }
            list = own_list.recv() => {
                let Some(list) = list else { break };
                if presence.note_pass(list.iter().any(|booking| booking.id == booking_id)) {
                    println!(
                        "[{}] booking #{booking_id} is not in your booking list yet; still watching",
                        stamp()
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }
    poller.shutdown();
    Ok(())
}

/// Distinguishes a booking the backend has not listed yet from one that is
/// simply not changing. Announces the absence once, never after a sighting.
#[derive(Default)]
struct WatchPresence {
    seen: bool,
    announced: bool,
}

impl WatchPresence {
    fn note_pass(&mut self, found: bool) -> bool {
        if found {
            self.seen = true;
            return false;
        }
        if self.seen || self.announced {
            return false;
        }
        self.announced = true;
        true
    }
}

/// Long-running poller session: dashboard for everyone, earnings and
/// new-request alerts for operators.
pub async fn run_watch(context: &CliContext, fast: bool) -> Result<(), CliError> {
    let session = context.restore_session()?;
    let operator = session.is_operator();
    let config = PollerConfig::default();
    let interval = if fast {
        config.fast_interval
    } else {
        config.normal_interval
    };

    let poller = Poller::new(
        context.api.clone(),
        SessionHandle::with_session(session),
        config,
    );
    if fast {
        poller.start_fast_polling();
    } else {
        poller.start_polling();
    }
    println!(
        "Polling every {}s; press Ctrl-C to stop.",
        interval.as_secs()
    );

    if operator {
        watch_operator(&poller).await;
    } else {
        watch_customer(&poller).await;
    }
    poller.shutdown();
    Ok(())
}

async fn watch_customer(poller: &Poller) {
    let mut dashboard = poller.subscribe_dashboard();
    let mut last: Option<DashboardSummary> = None;
    loop {
        tokio::select! {
            summary = dashboard.recv() => {
                let Some(summary) = summary else { break };
                report_dashboard(&mut last, summary);
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }
}

async fn watch_operator(poller: &Poller) {
    let mut dashboard = poller.subscribe_dashboard();
    let mut earnings = poller.subscribe_earnings();
    let mut requests = poller.subscribe_new_requests();
    let mut last_dashboard: Option<DashboardSummary> = None;
    let mut last_earnings: Option<EarningsSummary> = None;
    loop {
        tokio::select! {
            summary = dashboard.recv() => {
                let Some(summary) = summary else { break };
                report_dashboard(&mut last_dashboard, summary);
            }
            summary = earnings.recv() => {
                let Some(summary) = summary else { break };
                report_earnings(&mut last_earnings, summary);
            }
            booking = requests.recv() => {
                let Some(booking) = booking else { break };
                println!(
                    "[{}] new booking request #{}: {} on {} at {} ({})",
                    stamp(),
                    booking.id,
                    booking.machine_model,
                    booking.scheduled_date,
                    booking.scheduled_time.format("%H:%M"),
                    booking.location
                );
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }
}

fn report_dashboard(last: &mut Option<DashboardSummary>, summary: DashboardSummary) {
    if last.as_ref() == Some(&summary) {
        return;
    }
    println!(
        "[{}] bookings: {} total, {} pending, {} active, {} completed; spent {:.2}",
        stamp(),
        summary.total_bookings,
        summary.pending,
        summary.active,
        summary.completed,
        summary.total_spent
    );
    *last = Some(summary);
}

fn report_earnings(last: &mut Option<EarningsSummary>, summary: EarningsSummary) {
    if last.as_ref() == Some(&summary) {
        return;
    }
    println!(
        "[{}] earnings: {} completed jobs, {:.2} earned; {} open, {:.2} outstanding",
        stamp(),
        summary.completed_jobs,
        summary.total_earned,
        summary.open_jobs,
        summary.outstanding_amount
    );
    *last = Some(summary);
}
