//! Closed set of webhook event types.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::WebhookError;

/// Event types Lettermint delivers over webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    /// Message accepted by the API (`message.created`).
    #[serde(rename = "message.created")]
    MessageCreated,
    /// Message handed to the receiving server (`message.sent`).
    #[serde(rename = "message.sent")]
    MessageSent,
    /// Receiving server accepted the message (`message.delivered`).
    #[serde(rename = "message.delivered")]
    MessageDelivered,
    /// Permanent delivery failure (`message.hard_bounced`).
    #[serde(rename = "message.hard_bounced")]
    MessageHardBounced,
    /// Temporary delivery failure (`message.soft_bounced`).
    #[serde(rename = "message.soft_bounced")]
    MessageSoftBounced,
    /// Recipient marked the message as spam (`message.spam_complaint`).
    #[serde(rename = "message.spam_complaint")]
    MessageSpamComplaint,
    /// Message could not be processed (`message.failed`).
    #[serde(rename = "message.failed")]
    MessageFailed,
    /// Recipient is on a suppression list (`message.suppressed`).
    #[serde(rename = "message.suppressed")]
    MessageSuppressed,
    /// Recipient unsubscribed (`message.unsubscribed`).
    #[serde(rename = "message.unsubscribed")]
    MessageUnsubscribed,
    /// Inbound message received on a route (`message.inbound`).
    #[serde(rename = "message.inbound")]
    MessageInbound,
    /// Test delivery from the dashboard (`webhook.test`).
    #[serde(rename = "webhook.test")]
    WebhookTest,
}

impl EventType {
    /// Every event type, in wire order.
    pub const ALL: [Self; 11] = [
        Self::MessageCreated,
        Self::MessageSent,
        Self::MessageDelivered,
        Self::MessageHardBounced,
        Self::MessageSoftBounced,
        Self::MessageSpamComplaint,
        Self::MessageFailed,
        Self::MessageSuppressed,
        Self::MessageUnsubscribed,
        Self::MessageInbound,
        Self::WebhookTest,
    ];

    /// Returns the wire string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MessageCreated => "message.created",
            Self::MessageSent => "message.sent",
            Self::MessageDelivered => "message.delivered",
            Self::MessageHardBounced => "message.hard_bounced",
            Self::MessageSoftBounced => "message.soft_bounced",
            Self::MessageSpamComplaint => "message.spam_complaint",
            Self::MessageFailed => "message.failed",
            Self::MessageSuppressed => "message.suppressed",
            Self::MessageUnsubscribed => "message.unsubscribed",
            Self::MessageInbound => "message.inbound",
            Self::WebhookTest => "webhook.test",
        }
    }

    /// Hard or soft bounce.
    pub const fn is_bounce(self) -> bool {
        matches!(self, Self::MessageHardBounced | Self::MessageSoftBounced)
    }

    /// Bounce, failure or suppression.
    pub const fn is_delivery_issue(self) -> bool {
        matches!(
            self,
            Self::MessageHardBounced
                | Self::MessageSoftBounced
                | Self::MessageFailed
                | Self::MessageSuppressed
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event_type| event_type.as_str() == s)
            .ok_or_else(|| WebhookError::UnknownEventType { event: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_wire_string() {
        for event_type in EventType::ALL {
            assert_eq!(event_type.as_str().parse::<EventType>().unwrap(), event_type);
        }
        assert_eq!("message.hard_bounced".parse::<EventType>().unwrap(), EventType::MessageHardBounced);
    }

    #[test]
    fn unknown_wire_string_is_rejected() {
        let err = "message.teleported".parse::<EventType>().unwrap_err();
        assert_eq!(err, WebhookError::UnknownEventType { event: "message.teleported".to_string() });
    }

    #[test]
    fn bounce_classification() {
        let bounces: Vec<_> = EventType::ALL.into_iter().filter(|t| t.is_bounce()).collect();
        assert_eq!(bounces, vec![EventType::MessageHardBounced, EventType::MessageSoftBounced]);
    }

    #[test]
    fn delivery_issue_classification() {
        assert!(EventType::MessageHardBounced.is_delivery_issue());
        assert!(EventType::MessageSoftBounced.is_delivery_issue());
        assert!(EventType::MessageFailed.is_delivery_issue());
        assert!(EventType::MessageSuppressed.is_delivery_issue());
        assert!(!EventType::MessageDelivered.is_delivery_issue());
        assert!(!EventType::MessageSent.is_delivery_issue());
        assert!(!EventType::WebhookTest.is_delivery_issue());
    }

    #[test]
    fn serde_uses_wire_strings() {
        let json = serde_json::to_string(&EventType::MessageSpamComplaint).unwrap();
        assert_eq!(json, "\"message.spam_complaint\"");

        let parsed: EventType = serde_json::from_str("\"webhook.test\"").unwrap();
        assert_eq!(parsed, EventType::WebhookTest);
    }
}
