use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::NOTIFICATIONS;

string_enum! {
    pub enum Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub notification_id: i64,
    pub user_id: i64,
    pub notification_title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read_status: bool,
    pub priority: Priority,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

resource!(Notification, NOTIFICATIONS, notification_id);

impl Notification {
    /// Unread notification that expires after thirty days.
    pub fn new(user_id: i64, title: impl Into<String>, content: impl Into<String>, priority: Priority) -> Self {
        let now = Utc::now();
        Self {
            notification_id: 0,
            user_id,
            notification_title: title.into(),
            content: content.into(),
            created_at: now,
            read_status: false,
            priority,
            action_url: None,
            expiry_date: Some(now + Duration::days(30)),
        }
    }

    pub fn with_action(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotification {
    pub user_id: i64,
    pub notification_title: String,
    pub content: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl From<CreateNotification> for Notification {
    fn from(input: CreateNotification) -> Self {
        let mut notification = Notification::new(
            input.user_id,
            input.notification_title,
            input.content,
            input.priority.unwrap_or(Priority::Medium),
        );
        notification.action_url = input.action_url;
        if input.expiry_date.is_some() {
            notification.expiry_date = input.expiry_date;
        }
        notification
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
}
