use chrono::NaiveDate;
use earthmover_core::flow::{BookingDraft, BookingFlow};

use crate::commands::common::{
    bookings_for, find_booking, format_booking_lines, parse_time, print_json, CliContext,
};
use crate::error::CliError;

#[derive(Debug, Clone, Copy)]
pub enum BookingAction {
    Accept,
    Decline,
    Complete,
    Cancel,
}

pub async fn run_estimate(
    context: &CliContext,
    machine_id: i64,
    duration: &str,
) -> Result<(), CliError> {
    let flow = BookingFlow::new(context.api.clone());
    let estimate = flow.prepare_estimate(machine_id, duration).await?;

    println!(
        "Machine:    {} (#{})",
        estimate.model_name, estimate.machine_id
    );
    println!("Rate:       {:.2}/hour", estimate.price_per_hour);
    println!(
        "Duration:   {} minutes ({:.2} hours)",
        estimate.duration_minutes, estimate.total_hours
    );
    println!("Estimated:  {}", estimate.estimated_amount);
    Ok(())
}

pub async fn run_book(
    context: &CliContext,
    machine_id: i64,
    date: NaiveDate,
    time_text: &str,
    duration: &str,
    location: &str,
) -> Result<(), CliError> {
    let session = context.restore_session()?;
    let time = parse_time(time_text)?;

    let flow = BookingFlow::new(context.api.clone());
    let draft = BookingDraft {
        machine_id,
        scheduled_date: date,
        scheduled_time: time,
        duration_text: duration.to_string(),
        location: location.to_string(),
    };
    let booking = flow.submit(&session, &draft).await?;

    println!(
        "Booking #{} requested: {} on {} at {}",
        booking.id,
        booking.machine_model,
        booking.scheduled_date,
        booking.scheduled_time.format("%H:%M")
    );
    println!(
        "Duration:   {} minutes, amount {:.2}",
        booking.duration_minutes, booking.total_amount
    );
    println!("Status:     {}", booking.status);
    Ok(())
}

pub async fn run_list(context: &CliContext, as_json: bool) -> Result<(), CliError> {
    let session = context.restore_session()?;
    let bookings = bookings_for(&context.api, &session).await?;

    if as_json {
        print_json(&bookings)?;
    } else if bookings.is_empty() {
        println!("No bookings yet.");
    } else {
        for line in format_booking_lines(&bookings) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_action(
    context: &CliContext,
    action: BookingAction,
    booking_id: i64,
) -> Result<(), CliError> {
    let session = context.restore_session()?;
    let booking = find_booking(&context.api, &session, booking_id).await?;

    let flow = BookingFlow::new(context.api.clone());
    let message = match action {
        BookingAction::Accept => flow.accept(&session, &booking).await?,
        BookingAction::Decline => flow.decline(&session, &booking).await?,
        BookingAction::Complete => flow.complete(&booking).await?,
        BookingAction::Cancel => flow.cancel(&booking).await?,
    };
    println!("{message}");
    Ok(())
}
