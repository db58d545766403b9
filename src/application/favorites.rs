use crate::domain::commands::ToggleFavorite;
use crate::domain::{Book, BookId, FavoriteToggle, UserId};
use tracing::info;

use super::deps::ServiceDependencies;
use super::errors::Result;

/// お気に入りを切り替える
///
/// 追加か削除かは最後に把握している状態だけで決める（送信前の再確認はしない）。
/// 2つのタブから同時に切り替えた場合はサーバー側で後勝ちになる。
///
/// # 戻り値
/// 成功後のお気に入り状態
pub async fn toggle_favorite(
    deps: &ServiceDependencies,
    user_id: UserId,
    cmd: ToggleFavorite,
) -> Result<bool> {
    let toggle = FavoriteToggle::from_last_known(cmd.last_known);
    match toggle {
        FavoriteToggle::Add => deps.favorites.add_favorite(user_id, cmd.book_id).await?,
        FavoriteToggle::Remove => {
            deps.favorites
                .remove_favorite(user_id, cmd.book_id)
                .await?
        }
    }

    let is_favorite = toggle.resulting_state();
    info!(%user_id, book_id = %cmd.book_id, is_favorite, "favorite toggled");
    Ok(is_favorite)
}

/// 書籍詳細の初期状態
pub async fn is_favorite(deps: &ServiceDependencies, user_id: UserId, book_id: BookId) -> Result<bool> {
    Ok(deps.favorites.check_favorite(user_id, book_id).await?)
}

pub async fn favorites_of(deps: &ServiceDependencies, user_id: UserId) -> Result<Vec<Book>> {
    Ok(deps.favorites.favorites(user_id).await?)
}
