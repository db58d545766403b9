//! library - 図書館管理 API のコマンドラインクライアント

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use rusty_library_client::{
    adapters::http::HttpLibraryApi,
    application::{ServiceDependencies, SessionContext, borrow, messaging},
    config::Settings,
    domain::{Book, BookId, BorrowId, BorrowedBook, Credentials, Message, UserId},
    pages::{
        book_details::BookDetailsPage,
        borrowed_books::BorrowedBooksPage,
        browse_books::BrowseBooksPage,
        dashboard::{DashboardPage, DashboardView},
        favorites::FavoritesPage,
    },
    telemetry,
};

/// Command-line client for the library management API.
#[derive(Parser)]
#[command(name = "library", about = "Library management client")]
struct Cli {
    /// API base URL (overrides the configuration file).
    #[arg(long, env = "LIBRARY_API_BASE_URL")]
    base_url: Option<String>,

    /// Login email.
    #[arg(long, env = "LIBRARY_EMAIL")]
    email: String,

    /// Login password.
    #[arg(long, env = "LIBRARY_PASSWORD", hide_env_values = true)]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog.
    Books {
        /// Search title, author, or description.
        #[arg(long, default_value = "")]
        query: String,
        /// Category filter.
        #[arg(long, default_value = "All")]
        category: String,
    },
    /// Show one book with its reviews.
    Book { id: i64 },
    /// Borrow a book in your own name.
    Borrow { book_id: i64 },
    /// Record a return (admin).
    Return { borrow_id: i64 },
    /// Your active borrows.
    Borrowed,
    /// Your returned borrows.
    History,
    /// All active borrows (admin).
    Active,
    /// Overdue borrows (all for admins, your own otherwise).
    Overdue,
    /// Open your inbox, or the conversation with one user.
    Messages {
        #[arg(long = "with")]
        with: Option<i64>,
    },
    /// Send a message.
    Send { to: i64, content: String },
    /// Unread message count.
    Unread,
    /// Your favorite books.
    Favorites,
    /// Toggle a book in your favorites.
    Favorite { book_id: i64 },
    /// Reviews of a book.
    Reviews { book_id: i64 },
    /// Post a review.
    Review {
        book_id: i64,
        rating: i64,
        comment: String,
    },
    /// Dashboard for your role.
    Dashboard,
    /// Registered users (admin).
    Users,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load configuration")?;
    telemetry::init_tracing(&settings.logging).context("failed to install tracing subscriber")?;
    if let Some(base_url) = cli.base_url.clone() {
        settings.api.base_url = base_url;
    }

    if let Err(e) = run(cli, settings).await {
        tracing::error!(error = %e, "command failed");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let api = HttpLibraryApi::new(settings.api.base_url.clone(), settings.api.timeout())?;
    tracing::info!(base_url = %api.base_url(), "connecting");
    let deps = ServiceDependencies::from_backend(Arc::new(api));
    let session = Arc::new(SessionContext::new(deps.auth.clone()));

    let user = session
        .login(Credentials {
            email: cli.email,
            password: cli.password,
        })
        .await
        .context("login failed")?;

    match cli.command {
        Commands::Books { query, category } => {
            let page = BrowseBooksPage::new(deps);
            page.load().await?;
            page.set_query(&query);
            page.set_category(&category);
            for book in page.state().visible() {
                print_book(&book);
            }
        }

        Commands::Book { id } => {
            let page = BookDetailsPage::new(deps, session, BookId::new(id));
            page.load().await?;
            let state = page.state();
            if let Some(book) = &state.book {
                print_book(book);
                println!("  {}", book.description);
            }
            match state.average_rating() {
                Some(avg) => println!("  rating {avg:.1} ({} reviews)", state.reviews.len()),
                None => println!("  no reviews"),
            }
            println!("  favorite: {}", state.is_favorite);
        }

        Commands::Borrow { book_id } => {
            let page = BookDetailsPage::new(deps, session, BookId::new(book_id));
            page.load().await?;
            page.borrow().await?;
            if let Some(book) = page.state().book {
                println!("borrowed {:?}, {} copies left", book.title, book.available_copies);
            }
        }

        Commands::Return { borrow_id } => {
            let record = borrow::return_book(&deps, &user, BorrowId::new(borrow_id)).await?;
            match record.book.available_copies {
                Some(n) => println!("returned {:?}, {n} copies available", record.book.title),
                None => println!("returned {:?}", record.book.title),
            }
        }

        Commands::Borrowed => {
            let page = BorrowedBooksPage::new(deps, session);
            page.load().await?;
            print_borrows(&page.state().active);
        }

        Commands::History => {
            let page = BorrowedBooksPage::new(deps, session);
            page.load().await?;
            print_borrows(&page.state().history);
        }

        Commands::Active => {
            print_borrows(&borrow::all_active_borrows(&deps, &user).await?);
        }

        Commands::Overdue => {
            let records = if user.is_admin() {
                borrow::all_active_borrows(&deps, &user).await?
            } else {
                borrow::active_borrows_of(&deps, user.id).await?
            };
            print_borrows(&borrow::overdue(&records, Utc::now()));
        }

        Commands::Messages { with } => {
            let messages = match with {
                Some(partner) => {
                    messaging::open_conversation(&deps, user.id, UserId::new(partner)).await?
                }
                None => messaging::open_inbox(&deps, user.id).await?,
            };
            for message in &messages {
                print_message(message);
            }
        }

        Commands::Send { to, content } => {
            let sent = messaging::send_message(&deps, user.id, UserId::new(to), &content).await?;
            print_message(&sent);
        }

        Commands::Unread => {
            println!("{}", messaging::unread_count(&deps, user.id).await?);
        }

        Commands::Favorites => {
            let page = FavoritesPage::new(deps, session);
            page.load().await?;
            for book in page.state().books {
                print_book(&book);
            }
        }

        Commands::Favorite { book_id } => {
            let page = BookDetailsPage::new(deps, session, BookId::new(book_id));
            page.load().await?;
            let is_favorite = page.toggle_favorite().await?;
            println!("favorite: {is_favorite}");
        }

        Commands::Reviews { book_id } => {
            let page = BookDetailsPage::new(deps, session, BookId::new(book_id));
            page.load().await?;
            for review in page.state().reviews {
                println!(
                    "#{} {} {}/5 (+{} -{}) {}",
                    review.id,
                    review.username,
                    review.rating.value(),
                    review.likes,
                    review.dislikes,
                    review.comment
                );
            }
        }

        Commands::Review {
            book_id,
            rating,
            comment,
        } => {
            let page = BookDetailsPage::new(deps, session, BookId::new(book_id));
            page.load().await?;
            let review = page.post_review(rating, &comment).await?;
            println!("posted review #{}", review.id);
        }

        Commands::Dashboard => {
            let page = DashboardPage::new(deps, session);
            page.load().await?;
            match page.state().view {
                Some(DashboardView::User(d)) => {
                    println!("available books: {}", d.available_books);
                    println!("active borrows:  {}", d.active_borrows.len());
                    println!("overdue:         {}", d.overdue_borrows);
                    println!("categories:      {}", d.category_count());
                    println!("unread messages: {}", d.unread_messages);
                }
                Some(DashboardView::Admin(d)) => {
                    println!("total books:     {}", d.total_books);
                    println!("users:           {}", d.total_users);
                    println!("active borrows:  {}", d.active_borrows.len());
                    println!("overdue:         {}", d.overdue_borrows);
                    println!("unread messages: {}", d.unread_messages);
                    for category in &d.popular_categories {
                        println!("  {:<20} {}", category.name, category.count);
                    }
                }
                None => {}
            }
        }

        Commands::Users => {
            session.require_admin()?;
            for u in deps.users.list_users().await? {
                println!("#{} {} <{}> {}", u.id, u.username, u.email, u.role.as_str());
            }
        }
    }

    Ok(())
}

fn print_book(book: &Book) {
    println!(
        "#{} {} by {} [{}] {}/{}",
        book.id, book.title, book.author, book.category, book.available_copies, book.total_copies
    );
}

fn print_borrows(records: &[BorrowedBook]) {
    let now = Utc::now();
    for record in records {
        let flag = if record.is_overdue(now) { " OVERDUE" } else { "" };
        println!(
            "#{} {} user {} due {}{}",
            record.id,
            record.book.title,
            record.user_id,
            record.due_date.format("%Y-%m-%d"),
            flag
        );
    }
}

fn print_message(message: &Message) {
    let mark = if message.read { " " } else { "*" };
    println!(
        "{mark} {} {} -> {}: {}",
        message.created_at.format("%Y-%m-%d %H:%M"),
        message.sender_id,
        message.receiver_id,
        message.content
    );
}
