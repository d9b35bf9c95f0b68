//! PDF exports for ALLIANCE OSTEO.
//!
//! - [`Canvas`]: a page-by-page text canvas over `pdf-writer`
//! - [`SessionReport`]: feedback and transcript of one session
//! - [`SummaryReport`]: one student's scores across the program

mod canvas;
mod report;
mod text;

pub use canvas::{Canvas, Font, PAGE_HEIGHT, PAGE_WIDTH};
pub use report::{SessionReport, SummaryReport};
pub use text::{encode_win_ansi, truncate_chars, wrap};
