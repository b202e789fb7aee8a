//! Plain-text rendering of session snapshots.

use devmatch_core::{ChannelStatus, QueueStatus, SessionSnapshot};

/// Render `snapshot` as the lines shown to the user.
pub fn render(snapshot: &SessionSnapshot) -> String {
    let Some(identity) = &snapshot.identity else {
        return "signed out, /login <user> to start".to_string();
    };

    let mut status = format!(
        "[{identity}] {} | {}",
        queue_line(&snapshot.queue_status, snapshot.state.queue().len()),
        channel_line(&snapshot.channel_status)
    );
    if snapshot.failed_decisions > 0 {
        status.push_str(&format!(" | undelivered decisions: {}", snapshot.failed_decisions));
    }
    let mut lines = vec![status];

    match snapshot.head() {
        Some(head) => {
            lines.push(format!("next: {} ({})", head.display_name, head.id));
            if !head.bio.is_empty() {
                lines.push(format!("  {}", head.bio));
            }
        },
        None if matches!(snapshot.queue_status, QueueStatus::Ready | QueueStatus::Failed { .. }) => {
            lines.push("queue empty, /retry to fetch again".to_string());
        },
        None => {},
    }

    if let Some(matched) = snapshot.state.active_match() {
        lines.push(format!(
            "*** match with {} ({}) *** /dismiss to close",
            matched.profile.display_name, matched.profile.id
        ));
    }
    lines.join("\n")
}

fn queue_line(status: &QueueStatus, pending: usize) -> String {
    match status {
        QueueStatus::Idle => "queue idle".to_string(),
        QueueStatus::Loading => "loading candidates".to_string(),
        QueueStatus::Ready => format!("{pending} candidates"),
        QueueStatus::Failed { reason } => format!("fetch failed: {reason}"),
    }
}

fn channel_line(status: &ChannelStatus) -> String {
    match status {
        ChannelStatus::Closed => "matches off".to_string(),
        ChannelStatus::Connecting => "matches connecting".to_string(),
        ChannelStatus::Live => "matches live".to_string(),
        ChannelStatus::Disconnected { reason } => {
            format!("matches disconnected ({reason}), /reconnect")
        },
    }
}
