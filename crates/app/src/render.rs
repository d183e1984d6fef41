//! Terminal presentation
//!
//! Pure functions from state to text. Nothing here talks to the network or
//! holds state of its own.

use chrono::{DateTime, Utc};

use tm_core::notify::{Notification, NotificationLevel};
use tm_core::session::User;
use tm_core::task::{Task, TaskStatus};

use crate::routes::Route;

pub const APP_NAME: &str = "TaskMaster";
pub const LOADING: &str = "Loading...";

/// Actions a task card offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Edit,
    Delete,
    MarkInProgress,
    MarkCompleted,
}

impl CardAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Edit => "Edit",
            Self::Delete => "Delete",
            Self::MarkInProgress => "Mark as In Progress",
            Self::MarkCompleted => "Mark as Completed",
        }
    }
}

/// Status moves are only offered towards a status the task is not in
pub fn card_actions(task: &Task) -> Vec<CardAction> {
    let mut actions = vec![CardAction::Edit, CardAction::Delete];
    if task.status != Some(TaskStatus::InProgress) {
        actions.push(CardAction::MarkInProgress);
    }
    if task.status != Some(TaskStatus::Completed) {
        actions.push(CardAction::MarkCompleted);
    }
    actions
}

/// `Mon D, YYYY`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Navigation bar, or `None` on screens without chrome
pub fn navbar(route: &Route, user: Option<&User>) -> Option<String> {
    if !route.shows_chrome() {
        return None;
    }
    Some(match user {
        Some(user) => format!("{} | Hello, {}", APP_NAME, display_name(user)),
        None => APP_NAME.to_string(),
    })
}

fn display_name(user: &User) -> &str {
    if user.username.is_empty() {
        "User"
    } else {
        &user.username
    }
}

pub fn task_card(task: &Task) -> String {
    let mut badges = vec![format!("[{}]", task.priority.label())];
    if let Some(status) = task.status {
        badges.push(format!("[{}]", status.label()));
    }

    let actions = card_actions(task)
        .into_iter()
        .map(CardAction::label)
        .collect::<Vec<_>>()
        .join(" / ");

    format!(
        "#{} {}\n    {}\n    {}  Created: {}\n    Actions: {}",
        task.id,
        task.title,
        task.description,
        badges.join(" "),
        format_date(&task.created_at),
        actions
    )
}

/// The filtered task list, or the empty-state hint
pub fn task_list(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks found\nCreate your first task: taskmaster tasks create".to_string();
    }
    tasks
        .iter()
        .map(task_card)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn user_summary(user: &User) -> String {
    format!("{} <{}> (id {})", user.username, user.email, user.id)
}

pub fn notification(note: &Notification) -> String {
    match note.level {
        NotificationLevel::Success => format!("[ok] {}", note.message),
        NotificationLevel::Error => format!("[error] {}", note.message),
    }
}

/// Screen body for routes that have no data of their own
pub fn screen(route: &Route) -> String {
    match route {
        Route::Login => "Sign in with: taskmaster login -u <username> -p <password>".to_string(),
        Route::Register => {
            "Create an account with: taskmaster register -u <username> -e <email> -p <password> --confirm <password>"
                .to_string()
        }
        Route::NotFound(path) => format!(
            "404\nPage not found\nThe page you're looking for doesn't exist: {}",
            path
        ),
        Route::Root | Route::Tasks => String::new(),
    }
}
