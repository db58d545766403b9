use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::application::{LibraryError, Result};

/// ページのマウント状態
///
/// ページ生成時にマウント済みとなり、`unmount()` 以降に届いた応答は
/// 状態にマージせず破棄する。複製したスコープは同じ状態を共有する。
#[derive(Debug, Clone)]
pub struct PageScope {
    mounted: Arc<AtomicBool>,
}

impl PageScope {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// 応答をマージする直前に呼ぶ
    pub fn ensure_mounted(&self) -> Result<()> {
        if !self.is_mounted() {
            debug!("discarding response for unmounted page");
            return Err(LibraryError::Unmounted);
        }
        Ok(())
    }
}

impl Default for PageScope {
    fn default() -> Self {
        Self::new()
    }
}

/// 処理中の操作のキー集合
///
/// 同じキーの操作が処理中なら2回目は `RequestInFlight` で拒否する
/// （操作ボタンを無効化するのと同じ効果）。
#[derive(Debug)]
pub struct InFlight<K> {
    keys: Mutex<HashSet<K>>,
}

impl<K> InFlight<K>
where
    K: Eq + Hash + Clone + Display,
{
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(HashSet::new()),
        }
    }

    /// 操作を開始する
    ///
    /// 返されたガードが破棄されるとキーは解放される。
    pub fn begin(&self, key: K) -> Result<InFlightGuard<'_, K>> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.clone()) {
            return Err(LibraryError::RequestInFlight(key.to_string()));
        }
        Ok(InFlightGuard { owner: self, key })
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

impl<K> Default for InFlight<K>
where
    K: Eq + Hash + Clone + Display,
{
    fn default() -> Self {
        Self::new()
    }
}

/// 処理中キーのガード
pub struct InFlightGuard<'a, K>
where
    K: Eq + Hash,
{
    owner: &'a InFlight<K>,
    key: K,
}

impl<K> Drop for InFlightGuard<'_, K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        self.owner
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// ページ状態のロックを取る（毒化していても中身を使う）
pub(crate) fn lock<T>(state: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
