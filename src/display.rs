use crate::session::LiveStatus;

/// One-line status for the running (or just finished) test
pub fn format_status(status: &LiveStatus) -> String {
    let mut line = format!("Time Left: {}s", status.time_left_secs);
    if status.has_input {
        let m = status.metrics;
        line.push_str(&format!(
            " | WPM: {} | Net WPM: {} | Accuracy: {}%",
            m.gross_wpm, m.net_wpm, m.accuracy
        ));
    }
    if status.finished {
        line.push_str(" | Test Finished!");
    }
    line
}
