use crate::domain::task::TaskStatus;
use crate::dto::task::Task;
use chrono::NaiveDate;

/// Bucket label for tasks carrying no categories at all.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Headline numbers for a dashboard over the cached task view.
///
/// `due_today` and `overdue` only count pending tasks; a completed task whose date has
/// passed needs no attention. A task due today is counted in `due_today` alone, never
/// doubled into `overdue`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TaskTotals {
    pub pending: usize,
    pub completed: usize,
    pub deferred: usize,
    pub due_today: usize,
    pub overdue: usize,
}

/// Tallies the headline numbers for the given view. `today` comes from the caller so
/// the numbers are stable for the whole render that requested them.
pub fn totals(tasks: &[Task], today: NaiveDate) -> TaskTotals {
    let mut tally = TaskTotals::default();
    for task in tasks {
        match task.status {
            TaskStatus::Pending => tally.pending += 1,
            TaskStatus::Completed => tally.completed += 1,
            TaskStatus::Deferred => tally.deferred += 1,
        }
        if task.status != TaskStatus::Pending {
            continue;
        }
        match task.due_date {
            Some(due_date) if due_date == today => tally.due_today += 1,
            Some(due_date) if due_date < today => tally.overdue += 1,
            _ => {}
        }
    }
    tally
}

/// The cached view split by status, preserving the view's order within each bucket.
#[derive(Debug, Default)]
pub struct StatusGroups<'view> {
    pub pending: Vec<&'view Task>,
    pub completed: Vec<&'view Task>,
    pub deferred: Vec<&'view Task>,
}

pub fn group_by_status(tasks: &[Task]) -> StatusGroups<'_> {
    let mut groups = StatusGroups::default();
    for task in tasks {
        match task.status {
            TaskStatus::Pending => groups.pending.push(task),
            TaskStatus::Completed => groups.completed.push(task),
            TaskStatus::Deferred => groups.deferred.push(task),
        }
    }
    groups
}

/// Groups the cached view by category label.
///
/// Buckets appear in the order their labels first show up while walking the view, so
/// the dashboard's section order is stable across re-renders. A task carrying several
/// categories appears under each of them; tasks carrying none land in a trailing
/// [UNCATEGORIZED] bucket, which is only present when at least one such task exists.
pub fn group_by_category(tasks: &[Task]) -> Vec<(String, Vec<&Task>)> {
    let mut groups: Vec<(String, Vec<&Task>)> = Vec::new();
    let mut uncategorized: Vec<&Task> = Vec::new();

    for task in tasks {
        if task.categories.is_empty() {
            uncategorized.push(task);
            continue;
        }
        for category in &task.categories {
            match groups.iter_mut().find(|(label, _)| label == category) {
                Some((_, members)) => members.push(task),
                None => groups.push((category.clone(), vec![task])),
            }
        }
    }

    if !uncategorized.is_empty() {
        groups.push((UNCATEGORIZED.to_owned(), uncategorized));
    }
    groups
}
