//! Output formatting for planner results.
//!
//! This module handles rendering results for the terminal:
//! - [`report`] - Per-command text and JSON rendering
//! - [`terminal`] - Column and color helpers

mod report;
mod terminal;

pub use report::{
    render_blocks, render_check, render_cidr_info, render_ip_details, render_json, render_plan,
    render_security, render_simulation, render_suffix_ips, render_utilization,
};
pub use terminal::{flag, format_field, overlap_label};
