use crate::domain::BookId;
use std::fmt;

use super::session::SessionSnapshot;

/// 利用者向けページ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRoute {
    Dashboard,
    Borrowed,
    History,
    Messages,
    Browse,
    Book(BookId),
    Favorites,
    Profile,
}

/// 管理者向けページ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRoute {
    Dashboard,
    Books,
    Borrows,
    Messages,
}

/// アプリケーションのルート
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    User(UserRoute),
    Admin(AdminRoute),
}

impl Route {
    /// パスを解析する。未知のパスは `None`
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let route = match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["user", "dashboard"] => Route::User(UserRoute::Dashboard),
            ["user", "borrowed"] => Route::User(UserRoute::Borrowed),
            ["user", "history"] => Route::User(UserRoute::History),
            ["user", "messages"] => Route::User(UserRoute::Messages),
            ["user", "browse"] => Route::User(UserRoute::Browse),
            ["user", "book", id] => Route::User(UserRoute::Book(id.parse().ok()?)),
            ["user", "favorites"] => Route::User(UserRoute::Favorites),
            ["user", "profile"] => Route::User(UserRoute::Profile),
            ["admin", "dashboard"] => Route::Admin(AdminRoute::Dashboard),
            ["admin", "books"] => Route::Admin(AdminRoute::Books),
            ["admin", "borrows"] => Route::Admin(AdminRoute::Borrows),
            ["admin", "messages"] => Route::Admin(AdminRoute::Messages),
            _ => return None,
        };
        Some(route)
    }

    /// ログインが必要か
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::User(_) | Route::Admin(_))
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Route::Admin(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
            Route::User(route) => match route {
                UserRoute::Dashboard => write!(f, "/user/dashboard"),
                UserRoute::Borrowed => write!(f, "/user/borrowed"),
                UserRoute::History => write!(f, "/user/history"),
                UserRoute::Messages => write!(f, "/user/messages"),
                UserRoute::Browse => write!(f, "/user/browse"),
                UserRoute::Book(id) => write!(f, "/user/book/{id}"),
                UserRoute::Favorites => write!(f, "/user/favorites"),
                UserRoute::Profile => write!(f, "/user/profile"),
            },
            Route::Admin(route) => match route {
                AdminRoute::Dashboard => write!(f, "/admin/dashboard"),
                AdminRoute::Books => write!(f, "/admin/books"),
                AdminRoute::Borrows => write!(f, "/admin/borrows"),
                AdminRoute::Messages => write!(f, "/admin/messages"),
            },
        }
    }
}

/// ガードの判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// セッション確定待ち
    Pending,
    /// 表示してよい
    Allow,
    /// 別のルートへ移動する
    Redirect(Route),
}

/// ルートへのアクセスを判定する
///
/// ビジネスルール：
/// - セッション処理中は Pending
/// - `/` はログイン状態と役割に応じたダッシュボード、未ログインなら `/login`
/// - ログイン済みで `/login`・`/register` を開くと `/` へ
/// - 未ログインで保護ルートを開くと `/login` へ
/// - 一般利用者が管理者ルートを開くと `/user/dashboard` へ
///
/// これは表示上のゲートにすぎない。管理者APIの認可はサーバー側で行われる。
pub fn guard(session: &SessionSnapshot, route: Route) -> RouteDecision {
    if session.loading {
        return RouteDecision::Pending;
    }

    match route {
        Route::Home if !session.is_authenticated => RouteDecision::Redirect(Route::Login),
        Route::Home if session.is_admin => {
            RouteDecision::Redirect(Route::Admin(AdminRoute::Dashboard))
        }
        Route::Home => RouteDecision::Redirect(Route::User(UserRoute::Dashboard)),
        Route::Login | Route::Register if session.is_authenticated => {
            RouteDecision::Redirect(Route::Home)
        }
        Route::Login | Route::Register => RouteDecision::Allow,
        _ if !session.is_authenticated => RouteDecision::Redirect(Route::Login),
        _ if route.requires_admin() && !session.is_admin => {
            RouteDecision::Redirect(Route::User(UserRoute::Dashboard))
        }
        _ => RouteDecision::Allow,
    }
}

/// パスでアクセスを判定する。未知のパスは `/` へ
pub fn guard_path(session: &SessionSnapshot, path: &str) -> RouteDecision {
    match Route::parse(path) {
        Some(route) => guard(session, route),
        None => RouteDecision::Redirect(Route::Home),
    }
}
