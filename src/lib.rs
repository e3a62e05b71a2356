//! # DropShelf — 拖放暂存货架核心库
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │          展示层 / 平台拖放传输（外部协作者）             │
//! │   拖入事件 ─┐              ┌─ 拖出事件     WindowHost    │
//! └─────────────┼──────────────┼─────────────────────┼───────┘
//!               ↓              ↓                     ↓
//! ┌──────────────────────────────────────────────────────────┐
//! │  app ──────── ShelfApp（组合根）                          │
//! │                                                          │
//! │  ┌─ transfer ── 数据包 + 流水线                           │
//! │  │   ├─ ingest     拖入：识别格式 → 捕获条目 → 入集合    │
//! │  │   ├─ thumbnail  两阶段缩略图，失败回退图标            │
//! │  │   ├─ export     拖出：条目 → 数据包（位图落临时文件） │
//! │  │   └─ deferral   延迟信号，所有路径恰好完成一次        │
//! │  │                                                       │
//! │  ├─ shelf ───── 条目模型 + 可观察集合 + 格式化 + 图标      │
//! │  ├─ window ──── 外观策略 + 激活状态机 + 视图与同步桥       │
//! │  ├─ storage ─── 文件句柄 / 位图流 / 临时目录              │
//! │  ├─ settings ── JSON 设置                                 │
//! │  └─ error ───── ShelfError（统一错误类型）                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `ShelfError`，可序列化为字符串 |
//! | [`settings`] | 设置文件读写、窗口与文案配置、同步模式 |
//! | [`storage`] | 文件 / 文件夹句柄、位图流、应用私有临时目录 |
//! | [`shelf`] | 条目模型、共享集合、大小格式化、类型图标 |
//! | [`transfer`] | 拖入 / 拖出数据包与流水线 |
//! | [`window`] | 窗口外观、激活状态机、多窗口视图同步 |
//! | [`app`] | 组装以上模块的 `ShelfApp` |

pub mod app;
pub mod error;
pub mod settings;
pub mod shelf;
pub mod storage;
pub mod transfer;
pub mod window;

pub use app::ShelfApp;
pub use error::{Result, ShelfError};
