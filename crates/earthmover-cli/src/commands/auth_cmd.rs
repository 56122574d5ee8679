use earthmover_core::api::Credentials;

use crate::cli::AuthCommands;
use crate::commands::common::CliContext;
use crate::error::CliError;
use crate::session_store;

pub async fn run_auth(command: AuthCommands, api_url_flag: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login {
            role,
            identifier,
            password,
        } => {
            let context = CliContext::new(api_url_flag)?;
            let credentials = Credentials::new(identifier, password)?;
            let session = context.api.login(role.into(), &credentials).await?;
            session_store::save(&context.session_path, &session)?;
            println!("Signed in as {} ({})", session.name, session.role);
            Ok(())
        }
        AuthCommands::Status => {
            let path = session_store::default_session_path()?;
            match session_store::load(&path)? {
                Some(session) => println!(
                    "Signed in as {} ({}), account id {}",
                    session.name, session.role, session.user_id
                ),
                None => println!("Not signed in."),
            }
            Ok(())
        }
        AuthCommands::Logout => {
            let path = session_store::default_session_path()?;
            session_store::clear(&path)?;
            println!("Signed out.");
            Ok(())
        }
    }
}
