use crate::{Res, management::SessionManager, success};

pub async fn login(client_id: Option<String>, verbose: bool) -> Res<()> {
    let session = SessionManager::from_env(client_id.as_deref(), verbose)?;
    session.ensure_valid_token().await?;
    success!("Authentication successful!");
    Ok(())
}
