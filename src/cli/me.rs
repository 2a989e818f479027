use reqwest::Client;
use tabled::Table;

use crate::{
    Res, config, management::SessionManager, spotify, types::ProfileTableRow,
};

pub async fn me(client_id: Option<String>, verbose: bool) -> Res<()> {
    let session = SessionManager::from_env(client_id.as_deref(), verbose)?;
    let token = session.ensure_valid_token().await?;

    let profile = spotify::fetch_me(&Client::new(), &config::spotify_apiurl(), &token).await?;
    let table = Table::new(vec![ProfileTableRow::from(profile)]);
    println!("{}", table);
    Ok(())
}
