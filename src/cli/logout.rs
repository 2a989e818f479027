use crate::{Res, management::SessionManager, success};

pub async fn logout(verbose: bool) -> Res<()> {
    let session = SessionManager::from_env(None, verbose)?;
    session.clear_session().await?;
    success!("Stored session removed.");
    Ok(())
}
