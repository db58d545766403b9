use crate::ports::*;
use std::sync::Arc;

/// サービスの依存関係
///
/// データ構造として定義し、振る舞いは持たない。
/// アプリケーション関数はこれを参照で受け取る。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub books: Arc<dyn BookApi>,
    pub borrows: Arc<dyn BorrowApi>,
    pub messages: Arc<dyn MessageApi>,
    pub favorites: Arc<dyn FavoriteApi>,
    pub reviews: Arc<dyn ReviewApi>,
    pub users: Arc<dyn UserApi>,
    pub auth: Arc<dyn AuthApi>,
}

impl ServiceDependencies {
    /// すべてのポートを実装した1つのバックエンドから組み立てる
    pub fn from_backend<T>(backend: Arc<T>) -> Self
    where
        T: BookApi
            + BorrowApi
            + MessageApi
            + FavoriteApi
            + ReviewApi
            + UserApi
            + AuthApi
            + 'static,
    {
        Self {
            books: backend.clone(),
            borrows: backend.clone(),
            messages: backend.clone(),
            favorites: backend.clone(),
            reviews: backend.clone(),
            users: backend.clone(),
            auth: backend,
        }
    }
}
