//! # 窗口模块
//!
//! ## 设计思路
//!
//! 原生窗口本身是外部协作者，通过 `WindowHost` trait 注入；本模块只负责策略：
//!
//! - `WindowChrome`：静态外观策略（置顶、禁用最小化/最大化、尺寸、标题栏配色），
//!   在构造时应用一次，不是状态机
//! - `presence`：激活 / 失活两状态机，失焦后最多重新激活一次
//! - `view`：窗口对条目集合的视图，以及主窗口与扩展窗口之间的同步桥
//!
//! ## 实现思路
//!
//! ```text
//! ShelfWindow
//!   ├─ PresenceController ──→ WindowHost（apply_chrome / activate）
//!   └─ ShelfView ──→ ShelfCollection（共享实例，或快照 + 删除回调）
//! ```

mod presence;
mod view;

pub use presence::{ActivationState, PresenceController, PresenceState};
pub use view::{ShelfView, ViewStatus};

use crate::error::Result;
use crate::settings::{ShelfSettings, TitleBarSettings};

/// 窗口角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRole {
    /// 小尺寸主货架窗口
    Primary,
    /// "全部条目"扩展窗口
    Expanded,
}

/// 窗口静态外观策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowChrome {
    pub width: u32,
    pub height: u32,
    pub always_on_top: bool,
    pub minimizable: bool,
    pub maximizable: bool,
    pub resizable: bool,
    /// 内容延伸进标题栏（自定义标题栏）
    pub extends_content_into_title_bar: bool,
    pub title_bar: TitleBarSettings,
}

impl WindowChrome {
    pub fn for_role(role: WindowRole, settings: &ShelfSettings) -> Self {
        let window = match role {
            WindowRole::Primary => &settings.primary_window,
            WindowRole::Expanded => &settings.expanded_window,
        };
        Self {
            width: window.width,
            height: window.height,
            always_on_top: window.always_on_top,
            minimizable: false,
            maximizable: false,
            resizable: window.resizable,
            extends_content_into_title_bar: true,
            title_bar: settings.title_bar.clone(),
        }
    }
}

/// 原生窗口宿主
///
/// 实现方可能在 `activate` 内同步回调 `PresenceController::on_activation_changed`。
pub trait WindowHost: Send + Sync {
    /// 应用静态外观策略
    fn apply_chrome(&self, chrome: &WindowChrome) -> Result<()>;

    /// 请求激活窗口，返回平台是否接受
    fn activate(&self) -> bool;
}

/// 一个货架窗口：视图 + 激活状态机
pub struct ShelfWindow {
    pub view: ShelfView,
    pub presence: PresenceController,
}

impl ShelfWindow {
    pub fn role(&self) -> WindowRole {
        self.view.role()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Argb;

    #[test]
    fn primary_chrome_is_fixed_size() {
        let chrome = WindowChrome::for_role(WindowRole::Primary, &ShelfSettings::default());
        assert_eq!((chrome.width, chrome.height), (318, 315));
        assert!(!chrome.resizable);
        assert!(!chrome.minimizable && !chrome.maximizable);
        assert!(chrome.always_on_top);
        assert_eq!(chrome.title_bar.button_background, Argb::TRANSPARENT);
    }

    #[test]
    fn expanded_chrome_is_resizable() {
        let chrome = WindowChrome::for_role(WindowRole::Expanded, &ShelfSettings::default());
        assert_eq!((chrome.width, chrome.height), (700, 550));
        assert!(chrome.resizable);
        assert_eq!(
            chrome.title_bar.button_hover_background,
            Argb::new(255, 232, 17, 35)
        );
    }
}
