use crate::notify::types::{Notification, PercentageMove, TargetReached};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub text: String,
}

/// Pure formatting of a notification into a mail-style subject and body.
pub fn render(notification: &Notification) -> RenderedMessage {
    match notification {
        Notification::PercentageMove(m) => render_move(m),
        Notification::TargetReached(t) => render_target(t),
    }
}

fn render_move(m: &PercentageMove) -> RenderedMessage {
    let asset = m.asset.to_uppercase();
    RenderedMessage {
        subject: format!("Price Alert: {asset} Increased by {:.2}%", m.percent),
        text: format!(
            "Hello,\n\n\
             The price of {asset} has increased by {:.2}% in the last hour.\n\n\
             Old Price: ${}\n\
             New Price: ${}\n\
             Percentage Increase: {:.2}%\n\n\
             Best regards,\n\
             Your Price Monitoring Team",
            m.percent, m.old_price, m.new_price, m.percent
        ),
    }
}

fn render_target(t: &TargetReached) -> RenderedMessage {
    let asset = t.asset.to_uppercase();
    RenderedMessage {
        subject: format!("Price Alert: {asset} Reached ${}", t.target_price),
        text: format!(
            "Hello,\n\n\
             The price of {asset} has reached your target price of ${}!\n\n\
             Current Price: ${}\n\n\
             Best regards,\n\
             Your Price Monitoring Team",
            t.target_price, t.current_price
        ),
    }
}
