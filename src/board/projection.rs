use crate::model::{Column, Task, DEFAULT_COLUMN};

/// One column of the rendered board: the column record plus its tasks in
/// arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView {
    pub column: Column,
    pub tasks: Vec<Task>,
}

/// Groups tasks under their columns, sorted by `order` ascending. Never
/// authoritative and never patched incrementally: callers recompute on
/// every source change, which is linear in task count.
///
/// A task whose `status` matches no column falls back to "To Do", else to
/// the column with the smallest `order`, else it is dropped; no column is
/// ever fabricated for it.
pub fn project(columns: &[Column], tasks: &[Task]) -> Vec<ColumnView> {
    let mut views: Vec<ColumnView> = columns
        .iter()
        .map(|column| ColumnView {
            column: column.clone(),
            tasks: Vec::new(),
        })
        .collect();
    views.sort_by_key(|v| v.column.order);

    let fallback = views
        .iter()
        .position(|v| v.column.title == DEFAULT_COLUMN)
        .or(if views.is_empty() { None } else { Some(0) });

    for task in tasks {
        let slot = views
            .iter()
            .position(|v| v.column.id == task.status)
            .or(fallback);
        if let Some(index) = slot {
            views[index].tasks.push(task.clone());
        }
    }
    views
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn column(id: &str, title: &str, order: i64) -> Column {
        Column {
            id: id.to_string(),
            title: title.to_string(),
            order,
            created_at: Utc::now(),
        }
    }

    fn task(id: &str, status: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            description: String::new(),
            start_date: None,
            end_date: None,
            assigned_to: None,
            checklist: Vec::new(),
            status: status.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn groups_tasks_under_their_columns_in_order_key_order() {
        let columns = vec![
            column("c2", "In Progress", 4),
            column("c1", "To Do", 0),
            column("c3", "Done", 9),
        ];
        let tasks = vec![task("t1", "c2"), task("t2", "c1"), task("t3", "c2")];

        let views = project(&columns, &tasks);
        let titles: Vec<&str> = views.iter().map(|v| v.column.title.as_str()).collect();
        assert_eq!(titles, ["To Do", "In Progress", "Done"]);

        let in_progress: Vec<&str> = views[1].tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(in_progress, ["t1", "t3"]);
        assert!(views[2].tasks.is_empty());
    }

    #[test]
    fn dangling_status_falls_back_to_to_do() {
        let columns = vec![column("c1", "To Do", 0), column("c2", "Done", 2)];
        let views = project(&columns, &[task("t1", "gone")]);
        assert_eq!(views[0].tasks.len(), 1);
        assert!(views[1].tasks.is_empty());
    }

    #[test]
    fn dangling_status_without_to_do_uses_smallest_order() {
        let columns = vec![column("c5", "Review", 5), column("c3", "Backlog", 3)];
        let views = project(&columns, &[task("t1", "gone")]);
        assert_eq!(views[0].column.title, "Backlog");
        assert_eq!(views[0].tasks.len(), 1);
    }

    #[test]
    fn dangling_status_with_no_columns_drops_the_task() {
        let views = project(&[], &[task("t1", "gone")]);
        assert!(views.is_empty());
    }
}
