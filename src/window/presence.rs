//! 窗口激活状态机
//!
//! # 设计思路
//!
//! 两个状态：`Active` / `Inactive`。配置了焦点保持的窗口在进入 `Inactive` 时
//! 立即同步请求重新激活，表现为普通的焦点切换无法让它失活。
//!
//! # 实现思路
//!
//! - 每次失活事件至多一次重新激活尝试，尝试失败不重试。
//! - 尝试期间平台可能同步再次投递失活事件（例如窗口销毁中否决激活），
//!   `reactivating` 标志让这类重入事件只记录状态，不再发起新的尝试，
//!   从而不会形成无限递归。
//! - 窗口进入关闭流程后不再重新激活。
//! - 外观策略在构造时应用一次。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{WindowChrome, WindowHost, WindowRole};
use crate::error::Result;
use crate::settings::ShelfSettings;

/// 平台激活事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Activated,
    Deactivated,
}

/// 窗口激活状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Active,
    Inactive,
}

/// 激活状态机
pub struct PresenceController {
    host: Arc<dyn WindowHost>,
    role: WindowRole,
    retain_focus: bool,
    active: AtomicBool,
    reactivating: AtomicBool,
    closing: AtomicBool,
}

impl PresenceController {
    /// 创建状态机并应用外观策略
    pub fn new(host: Arc<dyn WindowHost>, role: WindowRole, settings: &ShelfSettings) -> Result<Self> {
        let chrome = WindowChrome::for_role(role, settings);
        host.apply_chrome(&chrome)?;

        let retain_focus = match role {
            WindowRole::Primary => settings.primary_window.retain_focus,
            WindowRole::Expanded => settings.expanded_window.retain_focus,
        };
        log::debug!("🪟 {:?} 窗口外观已应用，焦点保持: {}", role, retain_focus);

        Ok(Self {
            host,
            role,
            retain_focus,
            active: AtomicBool::new(false),
            reactivating: AtomicBool::new(false),
            closing: AtomicBool::new(false),
        })
    }

    pub fn role(&self) -> WindowRole {
        self.role
    }

    pub fn state(&self) -> PresenceState {
        if self.active.load(Ordering::Acquire) {
            PresenceState::Active
        } else {
            PresenceState::Inactive
        }
    }

    /// 首次显示窗口时请求激活
    pub fn open(&self) -> PresenceState {
        if self.host.activate() {
            self.active.store(true, Ordering::Release);
        }
        self.state()
    }

    /// 进入关闭流程，此后失活不再重新激活
    pub fn begin_close(&self) {
        self.closing.store(true, Ordering::Release);
    }

    /// 处理平台激活事件，返回处理后的状态
    pub fn on_activation_changed(&self, event: ActivationState) -> PresenceState {
        match event {
            ActivationState::Activated => {
                self.active.store(true, Ordering::Release);
            }
            ActivationState::Deactivated => {
                self.active.store(false, Ordering::Release);
                self.try_reactivate();
            }
        }
        self.state()
    }

    fn try_reactivate(&self) {
        if !self.retain_focus || self.closing.load(Ordering::Acquire) {
            return;
        }
        // 尝试期间的重入失活事件不再发起新的尝试
        if self.reactivating.swap(true, Ordering::AcqRel) {
            return;
        }

        let granted = self.host.activate();
        if granted {
            self.active.store(true, Ordering::Release);
        } else {
            log::debug!("{:?} 窗口重新激活被平台拒绝，保持失活", self.role);
        }

        self.reactivating.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Mutex, Weak};

    /// 可配置是否接受激活的假宿主
    #[derive(Default)]
    struct FakeHost {
        grant: AtomicBool,
        activations: AtomicUsize,
        chrome: Mutex<Vec<WindowChrome>>,
        /// 激活时同步回投失活事件
        veto_with_event: Mutex<Option<Weak<PresenceController>>>,
    }

    impl WindowHost for FakeHost {
        fn apply_chrome(&self, chrome: &WindowChrome) -> Result<()> {
            self.chrome.lock().unwrap().push(chrome.clone());
            Ok(())
        }

        fn activate(&self) -> bool {
            self.activations.fetch_add(1, Ordering::SeqCst);
            let controller = self.veto_with_event.lock().unwrap().clone();
            if let Some(controller) = controller.and_then(|weak| weak.upgrade()) {
                controller.on_activation_changed(ActivationState::Deactivated);
            }
            self.grant.load(Ordering::SeqCst)
        }
    }

    fn expanded(host: &Arc<FakeHost>) -> PresenceController {
        PresenceController::new(host.clone(), WindowRole::Expanded, &ShelfSettings::default())
            .expect("controller")
    }

    #[test]
    fn chrome_applied_once_at_construction() {
        let host = Arc::new(FakeHost::default());
        let controller = expanded(&host);
        controller.on_activation_changed(ActivationState::Deactivated);
        controller.on_activation_changed(ActivationState::Activated);
        assert_eq!(host.chrome.lock().unwrap().len(), 1);
    }

    #[test]
    fn deactivation_is_undone_immediately() {
        let host = Arc::new(FakeHost::default());
        host.grant.store(true, Ordering::SeqCst);
        let controller = expanded(&host);
        assert_eq!(controller.open(), PresenceState::Active);

        let state = controller.on_activation_changed(ActivationState::Deactivated);
        assert_eq!(state, PresenceState::Active);
        assert_eq!(host.activations.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn vetoed_activation_is_not_retried() {
        let host = Arc::new(FakeHost::default());
        let controller = expanded(&host);

        let state = controller.on_activation_changed(ActivationState::Deactivated);
        assert_eq!(state, PresenceState::Inactive);
        assert_eq!(host.activations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reentrant_deactivation_does_not_loop() {
        let host = Arc::new(FakeHost::default());
        let controller = Arc::new(expanded(&host));
        *host.veto_with_event.lock().unwrap() = Some(Arc::downgrade(&controller));

        let state = controller.on_activation_changed(ActivationState::Deactivated);
        assert_eq!(state, PresenceState::Inactive);
        assert_eq!(host.activations.load(Ordering::SeqCst), 1);

        // 下一次失活事件仍有一次新的尝试机会
        controller.on_activation_changed(ActivationState::Deactivated);
        assert_eq!(host.activations.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn primary_window_does_not_retain_focus() {
        let host = Arc::new(FakeHost::default());
        host.grant.store(true, Ordering::SeqCst);
        let controller =
            PresenceController::new(host.clone(), WindowRole::Primary, &ShelfSettings::default())
                .expect("controller");

        let state = controller.on_activation_changed(ActivationState::Deactivated);
        assert_eq!(state, PresenceState::Inactive);
        assert_eq!(host.activations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn closing_window_stays_inactive() {
        let host = Arc::new(FakeHost::default());
        host.grant.store(true, Ordering::SeqCst);
        let controller = expanded(&host);
        controller.begin_close();

        let state = controller.on_activation_changed(ActivationState::Deactivated);
        assert_eq!(state, PresenceState::Inactive);
        assert_eq!(host.activations.load(Ordering::SeqCst), 0);
    }
}
