use earthmover_core::models::{DashboardSummary, EarningsSummary};

use crate::commands::common::{bookings_for, print_json, CliContext};
use crate::error::CliError;

pub async fn run_dashboard(context: &CliContext, as_json: bool) -> Result<(), CliError> {
    let session = context.restore_session()?;
    let bookings = bookings_for(&context.api, &session).await?;
    let summary = DashboardSummary::from_bookings(&bookings);

    if as_json {
        print_json(&summary)?;
        return Ok(());
    }
    println!("Bookings:    {}", summary.total_bookings);
    println!("Pending:     {}", summary.pending);
    println!("Active:      {}", summary.active);
    println!("Completed:   {}", summary.completed);
    println!("Cancelled:   {}", summary.cancelled_or_declined);
    println!("Total spent: {:.2}", summary.total_spent);
    Ok(())
}

pub async fn run_earnings(context: &CliContext, as_json: bool) -> Result<(), CliError> {
    let session = context.require_operator()?;
    let bookings = context.api.operator_bookings(session.user_id).await?;
    let summary = EarningsSummary::from_bookings(&bookings);

    if as_json {
        print_json(&summary)?;
        return Ok(());
    }
    println!("Completed jobs: {}", summary.completed_jobs);
    println!("Total earned:   {:.2}", summary.total_earned);
    println!("Open jobs:      {}", summary.open_jobs);
    println!("Outstanding:    {:.2}", summary.outstanding_amount);
    Ok(())
}
