//! 可观察的共享条目集合
//!
//! # 设计思路
//!
//! `ShelfCollection` 是主窗口与扩展窗口共享的唯一条目序列：插入顺序即拖入顺序，
//! 按标识删除。变更通知通过显式订阅（`subscribe`）分发，视图无需任何 UI 框架即可测试。
//!
//! # 实现思路
//!
//! - 结构变更与待分发事件在同一把锁内完成，删除不会出现"存储已删、视图未删"的中间态。
//! - 通知在锁外分发；同一时刻只有一个分发循环（`dispatching` 标志），
//!   其它线程或监听器内部的重入变更只负责入队，由当前循环按变更顺序依次送达。
//! - `Subscription` 为 RAII 守卫，离开作用域自动取消订阅。
//! - 集合应归单一 UI 线程所有。在该线程上 `add` / `remove` 返回时，
//!   监听器已看到本次变更；若另一线程正持有分发循环，变更只入队，
//!   返回时监听器可能尚未收到通知。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::item::{ItemId, ShelfItem};

/// 集合变更动作
#[derive(Debug, Clone)]
pub enum ChangeAction {
    Added { item: Arc<ShelfItem>, index: usize },
    Removed { item: Arc<ShelfItem>, index: usize },
}

/// 变更通知：动作 + 变更后的条目数
#[derive(Debug, Clone)]
pub struct CollectionChange {
    pub action: ChangeAction,
    pub count: usize,
}

impl CollectionChange {
    pub fn item(&self) -> &Arc<ShelfItem> {
        match &self.action {
            ChangeAction::Added { item, .. } | ChangeAction::Removed { item, .. } => item,
        }
    }
}

type Listener = Arc<dyn Fn(&CollectionChange) + Send + Sync>;

struct State {
    items: Vec<Arc<ShelfItem>>,
    pending: VecDeque<CollectionChange>,
    dispatching: bool,
}

struct Shared {
    state: Mutex<State>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener: AtomicU64,
}

/// 共享条目集合句柄
///
/// `clone()` 得到的是同一个实例的另一个句柄，而不是副本。
#[derive(Clone)]
pub struct ShelfCollection {
    shared: Arc<Shared>,
}

impl Default for ShelfCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShelfCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShelfCollection")
            .field("count", &self.count())
            .finish()
    }
}

impl ShelfCollection {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    items: Vec::new(),
                    pending: VecDeque::new(),
                    dispatching: false,
                }),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// 追加条目并通知
    pub fn add(&self, item: Arc<ShelfItem>) {
        {
            let mut state = self.state();
            let index = state.items.len();
            state.items.push(Arc::clone(&item));
            let count = state.items.len();
            state.pending.push_back(CollectionChange {
                action: ChangeAction::Added { item, index },
                count,
            });
        }
        self.dispatch_pending();
    }

    /// 按标识删除条目并通知
    ///
    /// 返回被删除的条目；条目不在集合中时返回 `None` 且不产生通知。
    pub fn remove(&self, id: ItemId) -> Option<Arc<ShelfItem>> {
        let removed = {
            let mut state = self.state();
            let index = state.items.iter().position(|item| item.id() == id)?;
            let item = state.items.remove(index);
            let count = state.items.len();
            state.pending.push_back(CollectionChange {
                action: ChangeAction::Removed {
                    item: Arc::clone(&item),
                    index,
                },
                count,
            });
            item
        };
        self.dispatch_pending();
        log::debug!("🗑️ 已删除条目 {:?}", removed.id());
        Some(removed)
    }

    pub fn count(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.state().items.iter().any(|item| item.id() == id)
    }

    pub fn get(&self, id: ItemId) -> Option<Arc<ShelfItem>> {
        self.state().items.iter().find(|item| item.id() == id).cloned()
    }

    /// 当前条目的有序快照
    pub fn snapshot(&self) -> Vec<Arc<ShelfItem>> {
        self.state().items.clone()
    }

    /// 判断两个句柄是否指向同一个集合实例
    pub fn same_instance(&self, other: &ShelfCollection) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// 注册变更监听器
    ///
    /// 返回的 `Subscription` 被丢弃时自动取消订阅。
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CollectionChange) + Send + Sync + 'static,
    {
        let id = self.shared.next_listener.fetch_add(1, Ordering::Relaxed);
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        Subscription {
            shared: Arc::downgrade(&self.shared),
            id,
        }
    }

    fn dispatch_pending(&self) {
        {
            let mut state = self.state();
            if state.dispatching {
                return;
            }
            state.dispatching = true;
        }
        let _dispatching = DispatchGuard {
            collection: self,
        };

        loop {
            let change = {
                let mut state = self.state();
                match state.pending.pop_front() {
                    Some(change) => change,
                    None => {
                        state.dispatching = false;
                        break;
                    }
                }
            };
            let listeners: Vec<Listener> = self
                .shared
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            for listener in listeners {
                listener(&change);
            }
        }
    }
}

/// 监听器 panic 时复位分发状态
///
/// 正常退出时标志已在取空队列的同一把锁内清除，这里不再触碰。
struct DispatchGuard<'a> {
    collection: &'a ShelfCollection,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut state = self.collection.state();
            state.dispatching = false;
            state.pending.clear();
        }
    }
}

/// 订阅守卫，丢弃时取消订阅
pub struct Subscription {
    shared: Weak<Shared>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shelf::icon::IconGlyph;
    use crate::shelf::item::{ItemPayload, ItemPresentation};
    use proptest::prelude::*;

    fn text_item(text: &str) -> Arc<ShelfItem> {
        Arc::new(ShelfItem::new(
            ItemPresentation {
                display_name: text.to_string(),
                description: text.to_string(),
                icon: IconGlyph::Document,
                size_text: String::new(),
            },
            ItemPayload::Text(text.to_string()),
        ))
    }

    #[test]
    fn add_appends_in_order_and_notifies() {
        let collection = ShelfCollection::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = collection.subscribe(move |change| {
            sink.lock().unwrap().push((change.item().display_name().to_string(), change.count));
        });

        collection.add(text_item("a"));
        collection.add(text_item("b"));

        let names: Vec<_> = collection.snapshot().iter().map(|i| i.display_name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn remove_by_identity() {
        let collection = ShelfCollection::new();
        let a = text_item("same");
        let b = text_item("same");
        collection.add(Arc::clone(&a));
        collection.add(Arc::clone(&b));

        let removed = collection.remove(b.id()).expect("removed");
        assert_eq!(removed.id(), b.id());
        assert_eq!(collection.count(), 1);
        assert!(collection.contains(a.id()));
        assert!(collection.remove(b.id()).is_none());
    }

    #[test]
    fn listener_sees_consistent_state() {
        let collection = ShelfCollection::new();
        let observer = collection.clone();
        let mismatches = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&mismatches);
        let _sub = collection.subscribe(move |change| {
            if observer.count() != change.count {
                *sink.lock().unwrap() += 1;
            }
            if let ChangeAction::Removed { item, .. } = &change.action {
                if observer.contains(item.id()) {
                    *sink.lock().unwrap() += 1;
                }
            }
        });

        let item = text_item("x");
        collection.add(Arc::clone(&item));
        collection.remove(item.id());
        assert_eq!(*mismatches.lock().unwrap(), 0);
    }

    #[test]
    fn reentrant_mutation_is_delivered_in_order() {
        let collection = ShelfCollection::new();
        let handle = collection.clone();
        let order = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&order);
        let _sub = collection.subscribe(move |change| {
            let name = change.item().display_name().to_string();
            sink.lock().unwrap().push(name.clone());
            if name == "first" {
                handle.add(text_item("nested"));
            }
        });

        collection.add(text_item("first"));
        collection.add(text_item("second"));

        assert_eq!(*order.lock().unwrap(), vec!["first", "nested", "second"]);
        assert_eq!(collection.count(), 3);
    }

    #[test]
    fn dropping_subscription_stops_notifications() {
        let collection = ShelfCollection::new();
        let hits = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&hits);
        let sub = collection.subscribe(move |_| *sink.lock().unwrap() += 1);

        collection.add(text_item("a"));
        sub.unsubscribe();
        collection.add(text_item("b"));

        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn clones_share_one_instance() {
        let collection = ShelfCollection::new();
        let other = collection.clone();
        other.add(text_item("a"));
        assert_eq!(collection.count(), 1);
        assert!(collection.same_instance(&other));
        assert!(!collection.same_instance(&ShelfCollection::new()));
    }

    proptest! {
        #[test]
        fn count_tracks_adds_minus_removes(ops in proptest::collection::vec((any::<bool>(), 0usize..16), 0..64)) {
            let collection = ShelfCollection::new();
            let mut model: Vec<Arc<ShelfItem>> = Vec::new();

            for (i, (is_add, pick)) in ops.into_iter().enumerate() {
                if is_add || model.is_empty() {
                    let item = text_item(&i.to_string());
                    collection.add(Arc::clone(&item));
                    model.push(item);
                } else {
                    let victim = model.remove(pick % model.len());
                    prop_assert!(collection.remove(victim.id()).is_some());
                }
            }

            prop_assert_eq!(collection.count(), model.len());
            let ids: Vec<ItemId> = collection.snapshot().iter().map(|i| i.id()).collect();
            let expected: Vec<ItemId> = model.iter().map(|i| i.id()).collect();
            prop_assert_eq!(ids, expected);
        }
    }
}
