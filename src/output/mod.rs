pub mod formatter;

pub use formatter::{
    format_block_grid, format_breakdown, format_calories, format_distance, format_lock_report,
    format_projection, format_schedule, format_scoreboard, format_stakes, format_standings,
    should_use_colors,
};
