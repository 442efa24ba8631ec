//! # Postprocess
//!
//! 后处理流水线：从原始数据派生新的数据单元。
//!
//! 固定顺序：
//! 1. 时间戳修复 (timing repair)
//! 2. 飞行记录 (flight-book)
//! 3. 电源统计 (power statistics)
//! 4. 滑翔性能，基于位置
//! 5. 滑翔性能，基于速度
//!
//! 每个步骤只读取原始数据和更早步骤的输出，并整体替换自己的输出，
//! 因此在原始数据不变时重复运行结果一致。
//!
//! ## 使用示例
//!
//! ```ignore
//! use postprocess::Pipeline;
//!
//! let report = Pipeline::standard().run(system_id, &mut store, &config, &log);
//! for entry in &report.entries {
//!     println!("{}: {}", entry.name, entry.status.label());
//! }
//! ```

mod pass;
pub mod passes;
pub mod paths;
mod pipeline;

pub use pass::{pattern, PassContext, PassOutcome, PostprocessPass};
pub use pipeline::{PassReport, PassStatus, Pipeline, PipelineReport};
