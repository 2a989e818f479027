use reqwest::Client;
use tabled::{Table, Tabled};

use crate::{
    Res, config, info,
    management::SessionManager,
    spotify,
    types::{Paging, TopArtistTableRow, TopQuery, TopTrackTableRow},
    warning,
};

pub async fn top_artists(client_id: Option<String>, verbose: bool, query: TopQuery) -> Res<()> {
    let session = SessionManager::from_env(client_id.as_deref(), verbose)?;
    let token = session.ensure_valid_token().await?;

    let page =
        spotify::fetch_top_artists(&Client::new(), &config::spotify_apiurl(), &token, &query)
            .await?;
    print_page(page, TopArtistTableRow::new);
    Ok(())
}

pub async fn top_songs(client_id: Option<String>, verbose: bool, query: TopQuery) -> Res<()> {
    let session = SessionManager::from_env(client_id.as_deref(), verbose)?;
    let token = session.ensure_valid_token().await?;

    let page =
        spotify::fetch_top_tracks(&Client::new(), &config::spotify_apiurl(), &token, &query)
            .await?;
    print_page(page, TopTrackTableRow::new);
    Ok(())
}

/// Prints one ranked page followed by links to its neighbours.
fn print_page<T, R: Tabled>(page: Paging<T>, to_row: impl Fn(u64, T) -> R) {
    if page.items.is_empty() {
        warning!("No top items at offset {}.", page.offset);
        return;
    }

    let first_rank = page.offset + 1;
    let next = page.next.clone().zip(page.next_offset());
    let previous = page.previous.clone().zip(page.previous_offset());
    let total = page.total;

    let rows: Vec<R> = page
        .items
        .into_iter()
        .zip(first_rank..)
        .map(|(item, rank)| to_row(rank, item))
        .collect();
    let last_rank = first_rank + rows.len() as u64 - 1;

    println!("{}", Table::new(rows));
    info!("Showing {}-{} of {}", first_rank, last_rank, total);
    if let Some((url, offset)) = previous {
        info!("Previous page: --offset {} ({})", offset, url);
    }
    if let Some((url, offset)) = next {
        info!("Next page: --offset {} ({})", offset, url);
    }
}
