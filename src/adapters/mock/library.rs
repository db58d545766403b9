use crate::domain::commands::BorrowBook;
use crate::domain::*;
use crate::ports::*;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

/// パスワード付きで保持する利用者
#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password: String,
}

/// 採番カウンタ
#[derive(Debug, Default)]
struct Sequences {
    user: i64,
    book: i64,
    borrow: i64,
    message: i64,
    review: i64,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, StoredUser>,
    books: BTreeMap<BookId, Book>,
    borrows: BTreeMap<BorrowId, BorrowedBook>,
    messages: BTreeMap<MessageId, Message>,
    favorites: BTreeSet<Favorite>,
    reviews: BTreeMap<ReviewId, Review>,
    tokens: HashMap<String, UserId>,
    session_token: Option<String>,
    seq: Sequences,
}

impl State {
    fn book(&self, book_id: BookId) -> Result<&Book> {
        self.books
            .get(&book_id)
            .ok_or_else(|| ApiError::not_found("Book not found"))
    }

    fn user(&self, user_id: UserId) -> Result<&StoredUser> {
        self.users
            .get(&user_id)
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// 貸出記録に最新の書籍を結合する
    fn joined(&self, record: &BorrowedBook) -> BorrowedBook {
        let mut record = record.clone();
        if let Some(book) = self.books.get(&record.book_id) {
            record.book = BookSummary::from(book);
        }
        record
    }

    /// 利用者向けの一覧（書籍は蔵書数を含まない要約）
    fn summaries_where(&self, pred: impl Fn(&BorrowedBook) -> bool) -> Vec<BorrowedBook> {
        self.borrows_where(pred)
            .into_iter()
            .map(|mut record| {
                record.book = record.book.without_copies();
                record
            })
            .collect()
    }

    fn borrows_where(&self, pred: impl Fn(&BorrowedBook) -> bool) -> Vec<BorrowedBook> {
        self.borrows
            .values()
            .filter(|r| pred(r))
            .map(|r| self.joined(r))
            .collect()
    }

    fn issue_token(&mut self, user_id: UserId) -> String {
        let token = format!("token-{}-{}", user_id, self.tokens.len() + 1);
        self.tokens.insert(token.clone(), user_id);
        self.session_token = Some(token.clone());
        token
    }

    /// 貸出の本体（ロック内で原子的に実行される）
    fn open_borrow(
        &mut self,
        cmd: BorrowBook,
        borrowed_at: DateTime<Utc>,
    ) -> Result<BorrowedBook> {
        self.user(cmd.user_id)?;
        let book = self
            .books
            .get_mut(&cmd.book_id)
            .ok_or_else(|| ApiError::not_found("Book not found"))?;

        book.take_copy()
            .map_err(|e| ApiError::conflict(e.to_string()))?;
        let book = book.clone();

        self.seq.borrow += 1;
        let record = BorrowedBook::open(
            BorrowId::new(self.seq.borrow),
            cmd.user_id,
            &book,
            borrowed_at,
        );
        self.borrows.insert(record.id, record.clone());
        Ok(record)
    }
}

/// インメモリのライブラリAPI実装
///
/// リモートAPIのサーバー側ルールをそのまま持つ参照実装。
/// すべての状態変更は1つのロック内で行われるため、貸出可能数の減算は
/// 「0より大きければ減算」が原子的に実行される。
///
/// テストおよびHTTPスタブサーバーのバックエンドとして使用される。
pub struct InMemoryLibrary {
    state: Mutex<State>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// サンプルデータ入りで作成する
    ///
    /// 利用者：user1(1), admin1(2, 管理者), user2(3)。パスワードはすべて "password"。
    /// 書籍：6冊（1984 は所蔵3冊・貸出可能1冊）。
    pub fn with_sample_data() -> Self {
        let library = Self::new();
        let now = Utc::now();

        library.add_user("user1", "user1@example.com", "password", Role::User);
        library.add_user("admin1", "admin1@example.com", "password", Role::Admin);
        library.add_user("user2", "user2@example.com", "password", Role::User);

        let catalog = [
            ("To Kill a Mockingbird", "Harper Lee", "A novel about racial inequality and loss of innocence in the American South.", "978-0-06-112008-4", 1960, "Classic", 5, 3, 60),
            ("1984", "George Orwell", "A dystopian novel set in a totalitarian society.", "978-0-452-28423-4", 1949, "Science Fiction", 3, 1, 45),
            ("The Great Gatsby", "F. Scott Fitzgerald", "A novel about the American Dream and the Roaring Twenties.", "978-0-7432-7356-5", 1925, "Classic", 4, 2, 30),
            ("The Hobbit", "J.R.R. Tolkien", "A fantasy novel about the adventures of hobbit Bilbo Baggins.", "978-0-618-00221-4", 1937, "Fantasy", 6, 4, 75),
            ("Pride and Prejudice", "Jane Austen", "A romantic novel of manners set in early 19th-century England.", "978-0-14-143951-8", 1813, "Romance", 3, 2, 90),
            ("The Catcher in the Rye", "J.D. Salinger", "A novel about adolescent angst and alienation.", "978-0-316-76948-0", 1951, "Classic", 4, 3, 50),
        ];
        for (title, author, description, isbn, year, category, total, available, age_days) in catalog {
            library.insert_book(
                NewBook {
                    title: title.to_string(),
                    author: author.to_string(),
                    description: description.to_string(),
                    cover_image: format!("https://covers.example.com/{isbn}.jpg"),
                    isbn: isbn.to_string(),
                    publish_year: year,
                    category: category.to_string(),
                    total_copies: total,
                    available_copies: Some(available),
                },
                now - Duration::days(age_days),
            );
        }

        library
    }

    /// テスト用に利用者を登録する
    pub fn add_user(&self, username: &str, email: &str, password: &str, role: Role) -> User {
        let mut state = self.state.lock().unwrap();
        state.seq.user += 1;
        let user = User {
            id: UserId::new(state.seq.user),
            username: username.to_string(),
            email: email.to_string(),
            role,
            created_at: Some(Utc::now()),
        };
        state.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// テスト用に書籍を登録する（検証なし）
    pub fn insert_book(&self, book: NewBook, added_at: DateTime<Utc>) -> Book {
        let mut state = self.state.lock().unwrap();
        state.seq.book += 1;
        let book = book.into_book(BookId::new(state.seq.book), added_at);
        state.books.insert(book.id, book.clone());
        book
    }

    /// テスト用に過去日付で貸し出す
    pub fn borrow_at(&self, cmd: BorrowBook, borrowed_at: DateTime<Utc>) -> Result<BorrowedBook> {
        self.state.lock().unwrap().open_borrow(cmd, borrowed_at)
    }

    /// テスト用にメッセージを作成日時指定で登録する
    pub fn insert_message(&self, message: NewMessage, created_at: DateTime<Utc>) -> Message {
        let mut state = self.state.lock().unwrap();
        state.seq.message += 1;
        let message = Message {
            id: MessageId::new(state.seq.message),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            read: false,
            created_at,
        };
        state.messages.insert(message.id, message.clone());
        message
    }

    /// 書籍の現在の状態（サーバー視点）
    pub fn book_snapshot(&self, book_id: BookId) -> Option<Book> {
        self.state.lock().unwrap().books.get(&book_id).cloned()
    }

    /// 貸出記録の現在の状態（サーバー視点）
    pub fn borrow_snapshot(&self, borrow_id: BorrowId) -> Option<BorrowedBook> {
        let state = self.state.lock().unwrap();
        state.borrows.get(&borrow_id).map(|r| state.joined(r))
    }

    /// メッセージの現在の状態（サーバー視点）
    pub fn message_snapshot(&self, message_id: MessageId) -> Option<Message> {
        self.state.lock().unwrap().messages.get(&message_id).cloned()
    }

    /// Bearerトークンから利用者を引く
    pub fn authenticate(&self, token: &str) -> Option<User> {
        let state = self.state.lock().unwrap();
        let user_id = state.tokens.get(token)?;
        state.users.get(user_id).map(|u| u.user.clone())
    }

    /// インプロセス利用時に保持しているトークン
    pub fn session_token(&self) -> Option<String> {
        self.state.lock().unwrap().session_token.clone()
    }
}

impl Default for InMemoryLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookApi for InMemoryLibrary {
    async fn list_books(&self) -> Result<Vec<Book>> {
        Ok(self.state.lock().unwrap().books.values().cloned().collect())
    }

    async fn get_book(&self, book_id: BookId) -> Result<Book> {
        self.state.lock().unwrap().book(book_id).cloned()
    }

    async fn add_book(&self, book: NewBook) -> Result<Book> {
        book.validate()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        Ok(self.insert_book(book, Utc::now()))
    }

    async fn update_book(&self, book_id: BookId, update: BookUpdate) -> Result<Book> {
        let mut state = self.state.lock().unwrap();
        let book = state
            .books
            .get_mut(&book_id)
            .ok_or_else(|| ApiError::not_found("Book not found"))?;
        book.apply(&update)
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        Ok(book.clone())
    }

    async fn delete_book(&self, book_id: BookId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.book(book_id)?;
        let on_loan = state
            .borrows
            .values()
            .any(|r| r.book_id == book_id && r.is_active());
        if on_loan {
            return Err(ApiError::conflict("Book has active borrows"));
        }
        state.books.remove(&book_id);
        state.favorites.retain(|f| f.book_id != book_id);
        Ok(())
    }
}

#[async_trait]
impl BorrowApi for InMemoryLibrary {
    async fn borrow_book(&self, cmd: BorrowBook) -> Result<BorrowedBook> {
        self.state.lock().unwrap().open_borrow(cmd, Utc::now())
    }

    async fn return_book(&self, borrow_id: BorrowId) -> Result<BorrowedBook> {
        let mut state = self.state.lock().unwrap();
        let record = state
            .borrows
            .get(&borrow_id)
            .ok_or_else(|| ApiError::not_found("Borrow record not found"))?;
        let returned = record
            .mark_returned(Utc::now())
            .map_err(|e| ApiError::conflict(e.to_string()))?;

        if let Some(book) = state.books.get_mut(&returned.book_id) {
            book.restore_copy();
        }
        state.borrows.insert(borrow_id, returned.clone());
        Ok(state.joined(&returned))
    }

    async fn user_borrows(&self, user_id: UserId) -> Result<Vec<BorrowedBook>> {
        let state = self.state.lock().unwrap();
        Ok(state.summaries_where(|r| r.user_id == user_id && r.is_active()))
    }

    async fn user_history(&self, user_id: UserId) -> Result<Vec<BorrowedBook>> {
        let state = self.state.lock().unwrap();
        Ok(state.summaries_where(|r| r.user_id == user_id && !r.is_active()))
    }

    async fn active_borrows(&self) -> Result<Vec<BorrowedBook>> {
        let state = self.state.lock().unwrap();
        Ok(state.borrows_where(|r| r.is_active()))
    }
}

#[async_trait]
impl MessageApi for InMemoryLibrary {
    async fn user_messages(&self, user_id: UserId) -> Result<Vec<Message>> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<Message> = state
            .messages
            .values()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect();
        // サーバーは新しい順に返す
        messages.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(messages)
    }

    async fn send_message(&self, message: NewMessage) -> Result<Message> {
        message
            .validate()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        {
            let state = self.state.lock().unwrap();
            state.user(message.sender_id)?;
            state.user(message.receiver_id)?;
        }
        Ok(self.insert_message(message, Utc::now()))
    }

    async fn mark_read(&self, message_id: MessageId) -> Result<Message> {
        let mut state = self.state.lock().unwrap();
        let message = state
            .messages
            .remove(&message_id)
            .ok_or_else(|| ApiError::not_found("Message not found"))?
            .mark_read();
        state.messages.insert(message_id, message.clone());
        Ok(message)
    }

    async fn unread_messages(&self, user_id: UserId) -> Result<Vec<Message>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .values()
            .filter(|m| m.is_unread_for(user_id))
            .cloned()
            .collect())
    }

    async fn unread_count(&self, user_id: UserId) -> Result<u64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .values()
            .filter(|m| m.is_unread_for(user_id))
            .count() as u64)
    }
}

#[async_trait]
impl FavoriteApi for InMemoryLibrary {
    async fn favorites(&self, user_id: UserId) -> Result<Vec<Book>> {
        let state = self.state.lock().unwrap();
        state.user(user_id)?;
        Ok(state
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .filter_map(|f| state.books.get(&f.book_id).cloned())
            .collect())
    }

    async fn add_favorite(&self, user_id: UserId, book_id: BookId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.user(user_id)?;
        state.book(book_id)?;
        if !state.favorites.insert(Favorite::new(user_id, book_id)) {
            return Err(ApiError::bad_request("Book already in favorites"));
        }
        Ok(())
    }

    async fn remove_favorite(&self, user_id: UserId, book_id: BookId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.favorites.remove(&Favorite::new(user_id, book_id)) {
            return Err(ApiError::not_found("Favorite not found"));
        }
        Ok(())
    }

    async fn check_favorite(&self, user_id: UserId, book_id: BookId) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.favorites.contains(&Favorite::new(user_id, book_id)))
    }
}

#[async_trait]
impl ReviewApi for InMemoryLibrary {
    async fn book_reviews(&self, book_id: BookId) -> Result<Vec<Review>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .reviews
            .values()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn create_review(&self, review: NewReview) -> Result<Review> {
        let rating = review
            .validate()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        let mut state = self.state.lock().unwrap();
        state.book(review.book_id)?;
        let username = state.user(review.user_id)?.user.username.clone();

        state.seq.review += 1;
        let created = Review {
            id: ReviewId::new(state.seq.review),
            book_id: review.book_id,
            user_id: review.user_id,
            rating,
            comment: review.comment,
            likes: 0,
            dislikes: 0,
            created_at: Utc::now(),
            username,
        };
        state.reviews.insert(created.id, created.clone());
        Ok(created)
    }

    async fn like_review(&self, review_id: ReviewId) -> Result<Review> {
        let mut state = self.state.lock().unwrap();
        let review = state
            .reviews
            .get_mut(&review_id)
            .ok_or_else(|| ApiError::not_found("Review not found"))?;
        review.likes += 1;
        Ok(review.clone())
    }

    async fn dislike_review(&self, review_id: ReviewId) -> Result<Review> {
        let mut state = self.state.lock().unwrap();
        let review = state
            .reviews
            .get_mut(&review_id)
            .ok_or_else(|| ApiError::not_found("Review not found"))?;
        review.dislikes += 1;
        Ok(review.clone())
    }

    async fn delete_review(&self, review_id: ReviewId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .reviews
            .remove(&review_id)
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found("Review not found"))
    }
}

#[async_trait]
impl UserApi for InMemoryLibrary {
    async fn list_users(&self) -> Result<Vec<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.values().map(|u| u.user.clone()).collect())
    }

    async fn get_user(&self, user_id: UserId) -> Result<User> {
        let state = self.state.lock().unwrap();
        state.user(user_id).map(|u| u.user.clone())
    }

    async fn update_user(&self, user_id: UserId, update: UserUpdate) -> Result<User> {
        let mut state = self.state.lock().unwrap();
        let stored = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        if let Some(username) = update.username {
            if username.trim().is_empty() {
                return Err(ApiError::bad_request("username is required"));
            }
            stored.user.username = username;
        }
        if let Some(email) = update.email {
            if email.trim().is_empty() {
                return Err(ApiError::bad_request("email is required"));
            }
            stored.user.email = email;
        }
        Ok(stored.user.clone())
    }
}

#[async_trait]
impl AuthApi for InMemoryLibrary {
    async fn login(&self, credentials: Credentials) -> Result<AuthSession> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .values()
            .find(|u| u.user.email == credentials.email && u.password == credentials.password)
            .map(|u| u.user.clone())
            .ok_or_else(|| ApiError::bad_request("Invalid email or password"))?;
        let token = state.issue_token(user.id);
        Ok(AuthSession { token, user })
    }

    async fn register(&self, registration: Registration) -> Result<AuthSession> {
        registration
            .validate()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        let exists = {
            let state = self.state.lock().unwrap();
            state
                .users
                .values()
                .any(|u| u.user.email == registration.email)
        };
        if exists {
            return Err(ApiError::bad_request("Email already registered"));
        }
        let user = self.add_user(
            &registration.username,
            &registration.email,
            &registration.password,
            Role::User,
        );
        let token = self.state.lock().unwrap().issue_token(user.id);
        Ok(AuthSession { token, user })
    }

    async fn logout(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(token) = state.session_token.take() {
            state.tokens.remove(&token);
        }
        Ok(())
    }
}
