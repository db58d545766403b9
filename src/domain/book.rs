use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::value_objects::timestamp;
use super::{BookId, BorrowBookError, CopiesError, ValidationError};

/// 書籍
///
/// 不変条件：0 ≤ available_copies ≤ total_copies
///
/// `available` はワイヤ上に存在するが保持しない。常に `available_copies > 0` から導出する。
/// 受信時の `available` は無視される。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub publish_year: i32,
    #[serde(default)]
    pub category: String,
    pub total_copies: u32,
    pub available_copies: u32,
    #[serde(default, with = "timestamp::option")]
    pub added_at: Option<DateTime<Utc>>,
}

impl Serialize for Book {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Book", 12)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("title", &self.title)?;
        s.serialize_field("author", &self.author)?;
        s.serialize_field("description", &self.description)?;
        s.serialize_field("coverImage", &self.cover_image)?;
        s.serialize_field("isbn", &self.isbn)?;
        s.serialize_field("publishYear", &self.publish_year)?;
        s.serialize_field("category", &self.category)?;
        s.serialize_field("available", &self.is_available())?;
        s.serialize_field("totalCopies", &self.total_copies)?;
        s.serialize_field("availableCopies", &self.available_copies)?;
        s.serialize_field("addedAt", &self.added_at.map(|dt| dt.to_rfc3339()))?;
        s.end()
    }
}

impl Book {
    /// 貸出可能か
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// 蔵書数の不変条件を検証する
    pub fn check_copies(&self) -> Result<(), CopiesError> {
        check_copies(self.available_copies, self.total_copies)
    }

    /// 1冊貸し出す（0より大きい場合のみ減算）
    ///
    /// 読み取りと減算を分けずに1回で行う。並行する借り手はサーバー側のロック下でこれを呼ぶ。
    pub fn take_copy(&mut self) -> Result<(), BorrowBookError> {
        match self.available_copies.checked_sub(1) {
            Some(remaining) => {
                self.available_copies = remaining;
                Ok(())
            }
            None => Err(BorrowBookError::NoCopiesAvailable),
        }
    }

    /// 1冊戻す（所蔵数を上限とする）
    pub fn restore_copy(&mut self) {
        self.available_copies = self.available_copies.saturating_add(1).min(self.total_copies);
    }

    /// 部分更新を適用する
    ///
    /// 適用後に不変条件を満たさない場合は変更しない。
    pub fn apply(&mut self, update: &BookUpdate) -> Result<(), CopiesError> {
        let mut next = self.clone();
        if let Some(title) = &update.title {
            next.title = title.clone();
        }
        if let Some(author) = &update.author {
            next.author = author.clone();
        }
        if let Some(description) = &update.description {
            next.description = description.clone();
        }
        if let Some(cover_image) = &update.cover_image {
            next.cover_image = cover_image.clone();
        }
        if let Some(isbn) = &update.isbn {
            next.isbn = isbn.clone();
        }
        if let Some(publish_year) = update.publish_year {
            next.publish_year = publish_year;
        }
        if let Some(category) = &update.category {
            next.category = category.clone();
        }
        if let Some(total_copies) = update.total_copies {
            next.total_copies = total_copies;
        }
        if let Some(available_copies) = update.available_copies {
            next.available_copies = available_copies;
        }
        next.check_copies()?;
        *self = next;
        Ok(())
    }
}

/// 貸出記録に埋め込まれる書籍の要約
///
/// 利用者の貸出一覧と履歴には id・書名・著者・表紙だけが届く。
/// 蔵書数は貸出・返却・管理者の貸出中一覧の応答にだけ含まれる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_copies: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_copies: Option<u32>,
}

impl BookSummary {
    /// 蔵書数（貸出可能数, 所蔵数）。両方そろっている場合のみ
    pub fn copies(&self) -> Option<(u32, u32)> {
        self.available_copies.zip(self.total_copies)
    }

    /// 貸出可能か（蔵書数が届いていなければ不明）
    pub fn is_available(&self) -> Option<bool> {
        self.available_copies.map(|n| n > 0)
    }

    /// 蔵書数がそろっている場合だけ不変条件を検証する
    pub fn check_copies(&self) -> Result<(), CopiesError> {
        match self.copies() {
            Some((available, total)) => check_copies(available, total),
            None => Ok(()),
        }
    }

    /// 既知の書籍にこの要約を反映する
    ///
    /// 別の書籍、または蔵書数が届いていない場合は `None`。
    pub fn merged_into(&self, book: &Book) -> Option<Book> {
        let (available_copies, total_copies) = self.copies()?;
        if book.id != self.id {
            return None;
        }
        Some(Book {
            title: self.title.clone(),
            author: self.author.clone(),
            cover_image: self.cover_image.clone(),
            total_copies,
            available_copies,
            ..book.clone()
        })
    }

    /// 蔵書数を落とした要約（利用者向け一覧の形）
    pub fn without_copies(self) -> Self {
        Self {
            total_copies: None,
            available_copies: None,
            ..self
        }
    }
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            cover_image: book.cover_image.clone(),
            total_copies: Some(book.total_copies),
            available_copies: Some(book.available_copies),
        }
    }
}

fn check_copies(available: u32, total: u32) -> Result<(), CopiesError> {
    if available > total {
        return Err(CopiesError::AvailableExceedsTotal { available, total });
    }
    Ok(())
}

/// 新規書籍（POST /books のボディ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover_image: String,
    pub isbn: String,
    pub publish_year: i32,
    pub category: String,
    pub total_copies: u32,
    /// 省略時は所蔵数と同じ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_copies: Option<u32>,
}

impl NewBook {
    /// 登録時の貸出可能数
    pub fn initial_available_copies(&self) -> u32 {
        self.available_copies.unwrap_or(self.total_copies)
    }

    /// 登録フォームの検証
    ///
    /// 必須項目：タイトル、著者、説明、ISBN、カテゴリ、表紙画像URL
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("title", &self.title),
            ("author", &self.author),
            ("description", &self.description),
            ("isbn", &self.isbn),
            ("category", &self.category),
            ("coverImage", &self.cover_image),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::Required(field));
            }
        }
        check_copies(self.initial_available_copies(), self.total_copies)?;
        Ok(())
    }

    /// サーバー側で書籍レコードに変換する
    pub fn into_book(self, id: BookId, added_at: DateTime<Utc>) -> Book {
        let available_copies = self.initial_available_copies();
        Book {
            id,
            title: self.title,
            author: self.author,
            description: self.description,
            cover_image: self.cover_image,
            isbn: self.isbn,
            publish_year: self.publish_year,
            category: self.category,
            total_copies: self.total_copies,
            available_copies,
            added_at: Some(added_at),
        }
    }
}

/// 書籍の部分更新（PUT /books/{id} のボディ）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_copies: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_copies: Option<u32>,
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&Book> for BookUpdate {
    /// 編集フォームの下書き（全項目を埋めた状態）
    fn from(book: &Book) -> Self {
        Self {
            title: Some(book.title.clone()),
            author: Some(book.author.clone()),
            description: Some(book.description.clone()),
            cover_image: Some(book.cover_image.clone()),
            isbn: Some(book.isbn.clone()),
            publish_year: Some(book.publish_year),
            category: Some(book.category.clone()),
            total_copies: Some(book.total_copies),
            available_copies: Some(book.available_copies),
        }
    }
}
