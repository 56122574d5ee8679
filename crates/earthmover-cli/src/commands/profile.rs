use std::path::PathBuf;

use earthmover_core::api::ProfileUpdate;

use crate::commands::common::{load_photo, print_json, CliContext};
use crate::error::CliError;

pub async fn run_show(context: &CliContext, as_json: bool) -> Result<(), CliError> {
    let session = context.restore_session()?;
    let profile = context.api.profile(&session).await?;

    if as_json {
        print_json(&profile)?;
        return Ok(());
    }
    println!("Name:     {}", profile.name);
    println!("Phone:    {}", profile.phone);
    println!("Email:    {}", profile.email.as_deref().unwrap_or("-"));
    println!("Address:  {}", profile.address.as_deref().unwrap_or("-"));
    match &profile.photo {
        Some(photo) => println!("Photo:    {} bytes", photo.len()),
        None => println!("Photo:    -"),
    }
    Ok(())
}

pub async fn run_update(
    context: &CliContext,
    name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    photo_path: Option<PathBuf>,
) -> Result<(), CliError> {
    let session = context.restore_session()?;
    let photo = photo_path.map(|path| load_photo(&path)).transpose()?;

    let update = ProfileUpdate {
        name,
        phone,
        email,
        address,
        photo,
    }
    .normalized()?;
    let message = context.api.update_profile(&session, &update).await?;
    println!("{message}");
    Ok(())
}
