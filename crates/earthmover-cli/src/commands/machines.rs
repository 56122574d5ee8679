use earthmover_core::api::ApiError;

use crate::commands::common::{format_machine_lines, print_json, CliContext};
use crate::error::CliError;

pub async fn run_list(
    context: &CliContext,
    available_only: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let mut machines = context.api.machines().await?;
    if available_only {
        machines.retain(|machine| machine.available);
    }

    if as_json {
        print_json(&machines)?;
    } else if machines.is_empty() {
        println!("No machines found.");
    } else {
        for line in format_machine_lines(&machines) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_show(context: &CliContext, machine_id: i64, as_json: bool) -> Result<(), CliError> {
    let machine = context.api.machine(machine_id).await?;
    if as_json {
        print_json(&machine)?;
        return Ok(());
    }

    println!("Machine:    {} (#{})", machine.model_name, machine.id);
    println!("Type:       {}", machine.equipment_type);
    if let Some(year) = machine.year {
        println!("Year:       {year}");
    }
    println!("Rate:       {:.2}/hour", machine.price_per_hour);
    println!(
        "Status:     {}",
        if machine.available {
            "available"
        } else {
            "unavailable"
        }
    );
    if let Some(specs) = &machine.specs {
        println!("Specs:      {specs}");
    }
    if let Some(address) = &machine.address {
        println!("Location:   {address}");
    }

    match context.api.machine_operator(machine.id).await {
        Ok(operator) => println!("Operator:   {} ({})", operator.name, operator.phone),
        Err(ApiError::NoOperatorAssigned { .. }) => println!("Operator:   none assigned"),
        Err(error) => return Err(error.into()),
    }
    Ok(())
}
